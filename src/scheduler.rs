use crate::assets::Sprites;
use crate::config::{CadenceTier, GameConfig};
use crate::draw::{draw_text, Rgba};
use crate::game::{Direction, GameEnd, GameState};
use crate::platform::{Audio, Canvas, Clip, Controls, Key};
use log::debug;
use rand::Rng;

const BACKGROUND: Rgba = (20, 20, 30, 255);
const SNAKE: Rgba = (0, 0xb5, 0x0c, 255);
const FRUIT: Rgba = (220, 50, 50, 255);
const OBSTACLE: Rgba = (90, 90, 100, 255);
const HUD: Rgba = (230, 230, 230, 255);

const STEERING: [(Key, Direction); 4] = [
    (Key::Left, Direction::Left),
    (Key::Right, Direction::Right),
    (Key::Up, Direction::Up),
    (Key::Down, Direction::Down),
];

/// Frame interval as a function of snake length.
pub struct Cadence {
    tiers: Vec<CadenceTier>,
}

impl Cadence {
    pub fn new(tiers: &[CadenceTier]) -> Self {
        let mut tiers = tiers.to_vec();
        tiers.sort_by_key(|t| t.min_length);
        Self { tiers }
    }

    /// Seconds between frames for a snake of `length` cells. The tier with
    /// the largest threshold not above `length` wins.
    pub fn interval(&self, length: usize) -> f32 {
        let tier = self
            .tiers
            .iter()
            .rev()
            .find(|t| t.min_length <= length)
            .or_else(|| self.tiers.first());
        tier.map_or(0.1, |t| 1.0 / t.fps)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    Running,
    Finished(GameEnd),
}

/// Owns one game and drives it one logic tick at a time.
///
/// Input is read on every tick. Movement, rules and drawing happen together
/// whenever the accumulated time reaches the current frame interval.
pub struct GameLoop<R> {
    state: GameState,
    cadence: Cadence,
    sprites: Sprites,
    rng: R,
    since_render: f32,
    interval: f32,
    frames: u64,
    segment: u32,
    show_score: bool,
}

impl<R: Rng> GameLoop<R> {
    pub fn new(config: &GameConfig, sprites: Sprites, mut rng: R) -> Self {
        let state = GameState::new(config, &mut rng);
        let cadence = Cadence::new(&config.cadence);
        let interval = cadence.interval(state.snake().len());
        Self {
            state,
            cadence,
            sprites,
            rng,
            // first tick draws straight away
            since_render: interval,
            interval,
            frames: 0,
            segment: config.cell_size - config.segment_padding,
            show_score: config.show_score,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick<K, C, A>(
        &mut self,
        controls: &K,
        dt: f32,
        canvas: &mut C,
        audio: &mut A,
    ) -> anyhow::Result<TickStatus>
    where
        K: Controls + ?Sized,
        C: Canvas + ?Sized,
        A: Audio + ?Sized,
    {
        if let Some(end) = self.state.end() {
            return Ok(TickStatus::Finished(end));
        }

        self.read_controls(controls);
        if let Some(end) = self.state.end() {
            return Ok(TickStatus::Finished(end));
        }

        self.since_render += dt;
        let interval = self.cadence.interval(self.state.snake().len());
        if interval != self.interval {
            debug!("frame interval {:.3}s -> {:.3}s", self.interval, interval);
            self.interval = interval;
        }

        if self.since_render >= interval {
            let report = self.state.step(&mut self.rng);
            if report.ate {
                audio.play_once(Clip::Capture);
            }
            if report.obstacles_added > 0 {
                debug!("{} obstacle(s) on the board", self.state.obstacles().len());
            }
            if let Some(end) = report.end {
                debug!("final frame {}: {end}", self.frames + 1);
            }
            self.render(canvas)?;
            self.since_render = 0.0;
        }

        Ok(match self.state.end() {
            Some(end) => TickStatus::Finished(end),
            None => TickStatus::Running,
        })
    }

    fn read_controls<K: Controls + ?Sized>(&mut self, controls: &K) {
        for (key, direction) in STEERING {
            if controls.pressed(key) || controls.held(key) {
                self.state.steer(direction);
            }
        }
        if controls.pressed(Key::Escape) || controls.quit_requested() {
            self.state.quit();
        }
    }

    fn render<C: Canvas + ?Sized>(&mut self, canvas: &mut C) -> anyhow::Result<()> {
        let cell = self.state.grid().cell_size();
        let (width, height) = canvas.size();

        match &self.sprites.background {
            Some(bitmap) => canvas.blit(bitmap, 0, 0),
            None => canvas.fill_rect(0, 0, width, height, BACKGROUND),
        }

        if let Some(fruit) = self.state.fruit() {
            match &self.sprites.fruit {
                Some(bitmap) => canvas.blit(bitmap, fruit.x, fruit.y),
                None => canvas.fill_rect(fruit.x, fruit.y, cell, cell, FRUIT),
            }
        }

        for c in self.state.snake().cells() {
            canvas.fill_rect(c.x, c.y, self.segment, self.segment, SNAKE);
        }

        for o in self.state.obstacles() {
            match &self.sprites.obstacle {
                Some(bitmap) => canvas.blit(bitmap, o.x, o.y),
                None => canvas.fill_rect(o.x, o.y, cell, cell, OBSTACLE),
            }
        }

        if self.show_score {
            draw_text(canvas, &format!("SCORE:{}", self.state.score()), 6, 6, 2, HUD);
        }

        canvas.present()?;
        self.frames += 1;
        Ok(())
    }

    #[cfg(test)]
    fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::Frame;
    use crate::error::AssetError;
    use crate::game::Snake;
    use crate::grid::Cell;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::path::Path;

    #[derive(Default)]
    struct Keys {
        pressed: Vec<Key>,
        held: Vec<Key>,
        closed: bool,
    }

    impl Controls for Keys {
        fn pressed(&self, key: Key) -> bool {
            self.pressed.contains(&key)
        }

        fn held(&self, key: Key) -> bool {
            self.held.contains(&key)
        }

        fn quit_requested(&self) -> bool {
            self.closed
        }
    }

    #[derive(Default)]
    struct Recorder {
        played: Vec<Clip>,
    }

    impl Audio for Recorder {
        fn load(&mut self, _clip: Clip, _path: &Path) -> Result<(), AssetError> {
            Ok(())
        }

        fn play_once(&mut self, clip: Clip) {
            self.played.push(clip);
        }

        fn play_looping(&mut self, _clip: Clip) {}

        fn release(&mut self) {}
    }

    fn game_loop(seed: u64) -> GameLoop<SmallRng> {
        let config = GameConfig { obstacle_waves: Vec::new(), ..GameConfig::default() };
        GameLoop::new(&config, Sprites::default(), SmallRng::seed_from_u64(seed))
    }

    fn idle() -> Keys {
        Keys::default()
    }

    #[test]
    fn cadence_speeds_up_with_length() {
        let cadence = Cadence::new(&GameConfig::default().cadence);
        assert_eq!(cadence.interval(1), 0.1);
        assert_eq!(cadence.interval(3), 0.1);
        assert_eq!(cadence.interval(4), 1.0 / 15.0);
        assert_eq!(cadence.interval(8), 1.0 / 15.0);
        assert_eq!(cadence.interval(9), 0.05);
        assert_eq!(cadence.interval(40), 0.05);
    }

    #[test]
    fn cadence_below_every_tier_uses_the_lowest() {
        let cadence = Cadence::new(&[CadenceTier { min_length: 3, fps: 4.0 }]);
        assert_eq!(cadence.interval(1), 0.25);
    }

    #[test]
    fn longer_snake_draws_at_the_faster_rate() {
        let mut short = game_loop(10);
        let mut long = game_loop(10);
        let mut snake = Snake::new(Cell::new(300, 300));
        for x in [320, 340, 360] {
            snake.grow_to(Cell::new(x, 300));
        }
        assert_eq!(snake.len(), 4);
        long.state_mut().set_snake(snake);
        long.state_mut().set_fruit(Cell::new(0, 0));

        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        for game in [&mut short, &mut long] {
            game.tick(&idle(), 0.0, &mut frame, &mut audio).unwrap();
            game.tick(&idle(), 0.07, &mut frame, &mut audio).unwrap();
        }
        // 0.07 s is below 1/10 s but above 1/15 s
        assert_eq!(short.frames(), 1);
        assert_eq!(long.frames(), 2);
    }

    #[test]
    fn first_tick_draws_immediately() {
        let mut game = game_loop(1);
        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        let status = game.tick(&idle(), 0.0, &mut frame, &mut audio).unwrap();
        assert_eq!(status, TickStatus::Running);
        assert_eq!(game.frames(), 1);
    }

    #[test]
    fn frames_wait_for_the_interval() {
        let mut game = game_loop(2);
        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        game.tick(&idle(), 0.0, &mut frame, &mut audio).unwrap();
        game.tick(&idle(), 0.06, &mut frame, &mut audio).unwrap();
        assert_eq!(game.frames(), 1);
        game.tick(&idle(), 0.06, &mut frame, &mut audio).unwrap();
        assert_eq!(game.frames(), 2);
    }

    #[test]
    fn right_key_moves_the_head_one_cell_per_frame() {
        let mut game = game_loop(3);
        game.state_mut().set_fruit(Cell::new(0, 0));
        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        let right = Keys { pressed: vec![Key::Right], ..Keys::default() };

        game.tick(&right, 0.0, &mut frame, &mut audio).unwrap();
        assert_eq!(game.state().direction(), Direction::Right);
        assert_eq!(game.state().snake().head(), Cell::new(320, 300));

        // input alone does not move the snake between frames
        game.tick(&idle(), 0.01, &mut frame, &mut audio).unwrap();
        assert_eq!(game.state().snake().head(), Cell::new(320, 300));
        game.tick(&idle(), 0.2, &mut frame, &mut audio).unwrap();
        assert_eq!(game.state().snake().head(), Cell::new(340, 300));
        assert!(game.state().alive());
    }

    #[test]
    fn held_keys_are_applied_in_order_with_the_reversal_guard() {
        let mut game = game_loop(4);
        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        let both = Keys { held: vec![Key::Left, Key::Right], ..Keys::default() };
        game.tick(&both, 0.0, &mut frame, &mut audio).unwrap();
        assert_eq!(game.state().direction(), Direction::Left);
    }

    #[test]
    fn escape_quits_without_drawing() {
        let mut game = game_loop(5);
        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        let escape = Keys { pressed: vec![Key::Escape], ..Keys::default() };
        let status = game.tick(&escape, 1.0, &mut frame, &mut audio).unwrap();
        assert_eq!(status, TickStatus::Finished(GameEnd::Quit));
        assert_eq!(game.frames(), 0);
        // stays finished
        let status = game.tick(&idle(), 1.0, &mut frame, &mut audio).unwrap();
        assert_eq!(status, TickStatus::Finished(GameEnd::Quit));
    }

    #[test]
    fn closing_the_window_quits() {
        let mut game = game_loop(6);
        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        let closed = Keys { closed: true, ..Keys::default() };
        let status = game.tick(&closed, 0.0, &mut frame, &mut audio).unwrap();
        assert_eq!(status, TickStatus::Finished(GameEnd::Quit));
    }

    #[test]
    fn eating_plays_the_capture_sound() {
        let mut game = game_loop(7);
        game.state_mut().set_fruit(Cell::new(300, 280));
        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        let up = Keys { pressed: vec![Key::Up], ..Keys::default() };
        game.tick(&up, 0.0, &mut frame, &mut audio).unwrap();
        assert_eq!(audio.played, vec![Clip::Capture]);
        assert_eq!(game.state().score(), 1);
    }

    #[test]
    fn hitting_a_wall_finishes_after_the_last_frame() {
        let mut game = game_loop(8);
        game.state_mut().set_fruit(Cell::new(0, 0));
        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        let down = Keys { held: vec![Key::Down], ..Keys::default() };
        let mut status = TickStatus::Running;
        let mut ticks = 0;
        while status == TickStatus::Running {
            status = game.tick(&down, 0.1, &mut frame, &mut audio).unwrap();
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(status, TickStatus::Finished(GameEnd::WallCollision));
        // 15 rows below the center, the 15th step leaves the field
        assert_eq!(game.frames(), 15);
    }

    #[test]
    fn render_draws_snake_fruit_and_score() {
        let mut game = game_loop(9);
        game.state_mut().set_fruit(Cell::new(100, 100));
        let mut frame = Frame::new(600, 600);
        let mut audio = Recorder::default();
        game.tick(&idle(), 0.0, &mut frame, &mut audio).unwrap();
        assert_eq!(frame.pixel(300, 300), SNAKE);
        // padding strip at the right edge of the segment
        assert_eq!(frame.pixel(319, 300), BACKGROUND);
        assert_eq!(frame.pixel(110, 110), FRUIT);
        assert_eq!(frame.pixel(590, 590), BACKGROUND);
        // the 'S' of SCORE starts with a lit pixel one font pixel right of its origin
        assert_eq!(frame.pixel(8, 6), HUD);
    }
}
