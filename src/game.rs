use crate::config::{GameConfig, ObstacleWave};
use crate::grid::{Cell, Grid};
use crate::placement::Placement;
use ahash::AHashSet;
use log::{debug, info};
use rand::Rng;
use std::collections::VecDeque;
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Only before the first key press.
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::None => Direction::None,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Pixel displacement for one step of `cell_size`.
    pub fn delta(self, cell_size: i32) -> Option<(i32, i32)> {
        match self {
            Direction::None => None,
            Direction::Left => Some((-cell_size, 0)),
            Direction::Right => Some((cell_size, 0)),
            Direction::Up => Some((0, -cell_size)),
            Direction::Down => Some((0, cell_size)),
        }
    }
}

/// Why a game stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEnd {
    WallCollision,
    SelfCollision,
    ObstacleCollision,
    Quit,
    /// Nowhere left to put the fruit.
    BoardFull,
}

impl GameEnd {
    pub fn is_win(self) -> bool {
        self == GameEnd::BoardFull
    }
}

impl fmt::Display for GameEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GameEnd::WallCollision => "hit a wall",
            GameEnd::SelfCollision => "bit its own tail",
            GameEnd::ObstacleCollision => "hit an obstacle",
            GameEnd::Quit => "quit",
            GameEnd::BoardFull => "filled the board",
        };
        f.write_str(text)
    }
}

/// Snake body. The head is the most recently appended cell (back of the
/// deque), the tail is the oldest (front).
#[derive(Clone, Debug)]
pub struct Snake {
    body: VecDeque<Cell>,
    target_length: usize,
}

impl Snake {
    pub fn new(head: Cell) -> Self {
        let mut body = VecDeque::new();
        body.push_back(head);
        Self { body, target_length: 1 }
    }

    pub fn head(&self) -> Cell {
        // body is never empty: it starts with a head and advance() keeps at least one cell
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn target_length(&self) -> usize {
        self.target_length
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.body.iter().any(|&c| c == cell)
    }

    /// True if `cell` lies on the body, the head excluded.
    pub fn hits_body(&self, cell: Cell) -> bool {
        self.body.iter().rev().skip(1).any(|&c| c == cell)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.body.iter().copied()
    }

    /// Appends a new head and trims the tail down to the target length.
    pub fn advance(&mut self, head: Cell) {
        self.body.push_back(head);
        while self.body.len() > self.target_length.max(1) {
            self.body.pop_front();
        }
    }

    pub fn lengthen(&mut self) {
        self.target_length += 1;
    }

    #[cfg(test)]
    pub fn grow_to(&mut self, head: Cell) {
        self.lengthen();
        self.advance(head);
    }
}

struct Wave {
    length: usize,
    count: usize,
    fired: bool,
}

/// What happened during one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub ate: bool,
    pub obstacles_added: usize,
    pub end: Option<GameEnd>,
}

pub struct GameState {
    grid: Grid,
    placement: Placement,
    score: u32,
    end: Option<GameEnd>,
    direction: Direction,
    /// Direction of the last step actually taken.
    heading: Direction,
    snake: Snake,
    fruit: Option<Cell>,
    obstacles: AHashSet<Cell>,
    waves: Vec<Wave>,
}

impl GameState {
    pub fn new<R: Rng>(config: &GameConfig, rng: &mut R) -> Self {
        let grid = config.grid();
        let placement = Placement::new(grid, config.placement_attempts);
        let snake = Snake::new(grid.center());
        let obstacles = AHashSet::new();
        let fruit = placement.place_fruit(rng, &snake, &obstacles);
        let end = if fruit.is_none() { Some(GameEnd::BoardFull) } else { None };
        Self {
            grid,
            placement,
            score: 0,
            end,
            direction: Direction::None,
            heading: Direction::None,
            snake,
            fruit,
            obstacles,
            waves: config.obstacle_waves.iter().map(Wave::from).collect(),
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    #[cfg(test)]
    pub fn alive(&self) -> bool {
        self.end.is_none()
    }

    pub fn end(&self) -> Option<GameEnd> {
        self.end
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn fruit(&self) -> Option<Cell> {
        self.fruit
    }

    pub fn obstacles(&self) -> &AHashSet<Cell> {
        &self.obstacles
    }

    /// Requests a new direction. A 180° turn against either the requested or
    /// the last travelled direction is ignored. Returns whether it was taken.
    pub fn steer(&mut self, requested: Direction) -> bool {
        if requested == Direction::None
            || requested == self.direction.opposite()
            || requested == self.heading.opposite()
        {
            return false;
        }
        self.direction = requested;
        true
    }

    pub fn quit(&mut self) {
        self.finish(GameEnd::Quit);
    }

    /// One movement step followed by the collision and scoring rules.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> StepReport {
        let mut report = StepReport { end: self.end, ..StepReport::default() };
        if self.end.is_some() {
            return report;
        }

        report.obstacles_added = self.release_waves(rng);

        let Some((dx, dy)) = self.direction.delta(self.grid.cell_size() as i32) else {
            return report;
        };
        let head = self.snake.head().offset(dx, dy);
        self.snake.advance(head);
        self.heading = self.direction;

        if self.snake.hits_body(head) {
            self.finish(GameEnd::SelfCollision);
        }

        if self.fruit == Some(head) {
            self.score += 1;
            self.snake.lengthen();
            report.ate = true;
            info!("fruit eaten at ({}, {}), score {}", head.x, head.y, self.score);
            self.fruit = self.placement.place_fruit(rng, &self.snake, &self.obstacles);
            if self.fruit.is_none() {
                self.finish(GameEnd::BoardFull);
            }
        }

        if self.obstacles.contains(&head) {
            self.finish(GameEnd::ObstacleCollision);
        }

        if !self.grid.contains(head) {
            self.finish(GameEnd::WallCollision);
        }

        report.end = self.end;
        report
    }

    fn finish(&mut self, end: GameEnd) {
        if self.end.is_none() {
            debug!("game over: {end}");
            self.end = Some(end);
        }
    }

    fn ahead(&self) -> Option<Cell> {
        self.direction
            .delta(self.grid.cell_size() as i32)
            .map(|(dx, dy)| self.snake.head().offset(dx, dy))
    }

    /// Fires every wave whose length threshold has been reached. Each wave
    /// fires at most once per game.
    fn release_waves<R: Rng>(&mut self, rng: &mut R) -> usize {
        let length = self.snake.len();
        let mut count = 0;
        for wave in self.waves.iter_mut().filter(|w| !w.fired && length >= w.length) {
            wave.fired = true;
            count += wave.count;
        }
        if count == 0 {
            return 0;
        }

        let keep_clear: Vec<Cell> = self.fruit.into_iter().chain(self.ahead()).collect();
        let cells = self
            .placement
            .place_obstacles(rng, count, &self.snake, &self.obstacles, &keep_clear);
        info!("length {length}: {} new obstacle(s)", cells.len());
        let added = cells.len();
        self.obstacles.extend(cells);
        added
    }

    #[cfg(test)]
    pub fn set_fruit(&mut self, cell: Cell) {
        self.fruit = Some(cell);
    }

    #[cfg(test)]
    pub fn set_snake(&mut self, snake: Snake) {
        self.snake = snake;
    }
}

impl From<&ObstacleWave> for Wave {
    fn from(wave: &ObstacleWave) -> Self {
        Self { length: wave.length, count: wave.count, fired: false }
    }
}
