use crate::game::Snake;
use crate::grid::{Cell, Grid};
use ahash::AHashSet;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

/// Random placement of fruit and obstacles on free cells.
///
/// Sampling is rejection based and bounded by `attempts`; once the budget is
/// spent the free cells are enumerated and one is picked uniformly, so a
/// crowded board never spins.
#[derive(Clone, Copy, Debug)]
pub struct Placement {
    grid: Grid,
    attempts: u32,
}

impl Placement {
    pub fn new(grid: Grid, attempts: u32) -> Self {
        Self { grid, attempts }
    }

    /// Returns a cell that is neither on the snake nor an obstacle, or `None`
    /// if the board is full.
    pub fn place_fruit<R: Rng>(
        &self,
        rng: &mut R,
        snake: &Snake,
        obstacles: &AHashSet<Cell>,
    ) -> Option<Cell> {
        self.free_cell(rng, |c| snake.contains(c) || obstacles.contains(&c))
    }

    /// Picks up to `count` distinct free cells for new obstacles. Cells in
    /// `keep_clear` (the fruit, the cell ahead of the head) are never chosen.
    /// Fewer than `count` cells come back only when the board runs out.
    pub fn place_obstacles<R: Rng>(
        &self,
        rng: &mut R,
        count: usize,
        snake: &Snake,
        obstacles: &AHashSet<Cell>,
        keep_clear: &[Cell],
    ) -> Vec<Cell> {
        let mut placed: Vec<Cell> = Vec::with_capacity(count);
        for _ in 0..count {
            let cell = self.free_cell(rng, |c| {
                snake.contains(c)
                    || obstacles.contains(&c)
                    || keep_clear.contains(&c)
                    || placed.contains(&c)
            });
            match cell {
                Some(c) => placed.push(c),
                None => break,
            }
        }
        placed
    }

    fn free_cell<R, F>(&self, rng: &mut R, blocked: F) -> Option<Cell>
    where
        R: Rng,
        F: Fn(Cell) -> bool,
    {
        let total = self.grid.cell_count();
        if total == 0 {
            return None;
        }
        for _ in 0..self.attempts {
            let cell = self.grid.cell_at(rng.gen_range(0..total));
            if !blocked(cell) {
                return Some(cell);
            }
        }
        debug!("no free cell after {} samples, scanning the board", self.attempts);
        let free: Vec<Cell> = self.grid.cells().filter(|&c| !blocked(c)).collect();
        free.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn snake_on_row(grid: &Grid, row: u32, len: u32) -> Snake {
        let mut snake = Snake::new(grid.cell(0, row));
        for col in 1..len {
            snake.grow_to(grid.cell(col, row));
        }
        snake
    }

    #[test]
    fn fruit_avoids_snake_and_obstacles() {
        let grid = Grid::new(100, 100, 20);
        let placement = Placement::new(grid, 64);
        let snake = snake_on_row(&grid, 0, 5);
        let obstacles: AHashSet<Cell> = (0..5).map(|c| grid.cell(c, 1)).collect();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let fruit = placement.place_fruit(&mut rng, &snake, &obstacles).unwrap();
            assert!(!snake.contains(fruit));
            assert!(!obstacles.contains(&fruit));
            assert!(grid.contains(fruit));
        }
    }

    #[test]
    fn fruit_falls_back_to_scan_with_zero_attempts() {
        let grid = Grid::new(60, 60, 20);
        let placement = Placement::new(grid, 0);
        let snake = snake_on_row(&grid, 0, 3);
        let obstacles: AHashSet<Cell> = (0..3).map(|c| grid.cell(c, 1)).collect();
        let mut rng = SmallRng::seed_from_u64(1);
        let fruit = placement.place_fruit(&mut rng, &snake, &obstacles).unwrap();
        assert_eq!(fruit.y, 40);
    }

    #[test]
    fn fruit_finds_last_free_cell() {
        let grid = Grid::new(60, 60, 20);
        let placement = Placement::new(grid, 4);
        let snake = snake_on_row(&grid, 0, 3);
        let obstacles: AHashSet<Cell> = grid
            .cells()
            .filter(|c| c.y > 0 && *c != grid.cell(2, 2))
            .collect();
        let mut rng = SmallRng::seed_from_u64(99);
        assert_eq!(
            placement.place_fruit(&mut rng, &snake, &obstacles),
            Some(grid.cell(2, 2))
        );
    }

    #[test]
    fn fruit_on_full_board_is_none() {
        let grid = Grid::new(40, 20, 20);
        let placement = Placement::new(grid, 16);
        let snake = snake_on_row(&grid, 0, 2);
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(placement.place_fruit(&mut rng, &snake, &AHashSet::new()), None);
    }

    #[test]
    fn obstacles_are_distinct_and_keep_clear() {
        let grid = Grid::new(100, 100, 20);
        let placement = Placement::new(grid, 64);
        let snake = snake_on_row(&grid, 2, 3);
        let existing: AHashSet<Cell> = [grid.cell(4, 4)].into_iter().collect();
        let fruit = grid.cell(0, 0);
        let mut rng = SmallRng::seed_from_u64(11);
        let placed = placement.place_obstacles(&mut rng, 5, &snake, &existing, &[fruit]);
        assert_eq!(placed.len(), 5);
        let unique: AHashSet<Cell> = placed.iter().copied().collect();
        assert_eq!(unique.len(), 5);
        for cell in placed {
            assert_ne!(cell, fruit);
            assert!(!snake.contains(cell));
            assert!(!existing.contains(&cell));
        }
    }

    #[test]
    fn obstacles_stop_when_board_runs_out() {
        let grid = Grid::new(60, 20, 20);
        let placement = Placement::new(grid, 8);
        let snake = Snake::new(grid.cell(0, 0));
        let mut rng = SmallRng::seed_from_u64(5);
        let placed = placement.place_obstacles(&mut rng, 5, &snake, &AHashSet::new(), &[]);
        assert_eq!(placed.len(), 2);
    }
}
