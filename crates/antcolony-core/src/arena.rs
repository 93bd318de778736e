//! Static wall grid and line-of-sight queries.

use crate::{ColonyConfig, WorldStateError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis directions a generated wall segment can extend in.
const SEGMENT_STEPS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Immutable passability grid; `true` cells are walls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallGrid {
    cols: u32,
    rows: u32,
    cell_size: f32,
    cells: Vec<bool>,
}

impl WallGrid {
    /// Grid with only the border walls set.
    pub fn bordered(cols: u32, rows: u32, cell_size: f32) -> Result<Self, WorldStateError> {
        if cols < 3 || rows < 3 {
            return Err(WorldStateError::InvalidConfig(
                "wall grid must span at least 3x3 cells",
            ));
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(WorldStateError::InvalidConfig("cell_size must be positive"));
        }
        let mut grid = Self {
            cols,
            rows,
            cell_size,
            cells: vec![false; cols as usize * rows as usize],
        };
        for col in 0..cols {
            grid.cells[col as usize] = true;
            let bottom = grid.offset(col, rows - 1);
            grid.cells[bottom] = true;
        }
        for row in 0..rows {
            let left = grid.offset(0, row);
            let right = grid.offset(cols - 1, row);
            grid.cells[left] = true;
            grid.cells[right] = true;
        }
        Ok(grid)
    }

    /// Border walls plus `wall_segments` random interior segments.
    pub fn generate(config: &ColonyConfig, rng: &mut impl Rng) -> Result<Self, WorldStateError> {
        let (cols, rows) = config.validate()?;
        let mut grid = Self::bordered(cols, rows, config.cell_size as f32)?;
        for _ in 0..config.wall_segments {
            let start_col = rng.gen_range(1..cols - 1);
            let start_row = rng.gen_range(1..rows - 1);
            let length = rng.gen_range(config.wall_min_length..=config.wall_max_length);
            let (step_x, step_y) = SEGMENT_STEPS[rng.gen_range(0..SEGMENT_STEPS.len())];
            grid.stamp_segment(start_col, start_row, length, step_x, step_y);
        }
        Ok(grid)
    }

    fn stamp_segment(&mut self, col: u32, row: u32, length: u32, step_x: i64, step_y: i64) {
        for i in 0..i64::from(length) {
            let x = i64::from(col) + step_x * i;
            let y = i64::from(row) + step_y * i;
            if x > 0 && x < i64::from(self.cols) - 1 && y > 0 && y < i64::from(self.rows) - 1 {
                let idx = self.offset(x as u32, y as u32);
                self.cells[idx] = true;
            }
        }
    }

    #[inline]
    fn offset(&self, col: u32, row: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Row-major wall flags.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Whether the cell at `(col, row)` is a wall. Out-of-bounds cells count as walls.
    #[must_use]
    pub fn is_wall(&self, col: u32, row: u32) -> bool {
        if col >= self.cols || row >= self.rows {
            return true;
        }
        self.cells[self.offset(col, row)]
    }

    /// Set or clear an interior wall cell. Border cells always stay walls.
    pub fn set_wall(&mut self, col: u32, row: u32, wall: bool) {
        if col == 0 || row == 0 || col >= self.cols - 1 || row >= self.rows - 1 {
            return;
        }
        let idx = self.offset(col, row);
        self.cells[idx] = wall;
    }

    /// Whether the continuous point `(x, y)` lies in an open cell of the grid.
    #[must_use]
    pub fn is_walkable(&self, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let col = (x / self.cell_size).floor();
        let row = (y / self.cell_size).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f32 || row >= self.rows as f32 {
            return false;
        }
        !self.cells[self.offset(col as u32, row as u32)]
    }

    /// Sample `samples` evenly spaced points along a ray; true at the first wall hit.
    ///
    /// Sampling is sparse, so walls thinner than `max_distance / samples` can be
    /// stepped over.
    #[must_use]
    pub fn raycast_wall(
        &self,
        origin_x: f32,
        origin_y: f32,
        angle: f32,
        max_distance: f32,
        samples: u32,
    ) -> bool {
        let samples = samples.max(1);
        let step = max_distance / samples as f32;
        let (sin, cos) = angle.sin_cos();
        (1..=samples).any(|i| {
            let travelled = step * i as f32;
            !self.is_walkable(origin_x + cos * travelled, origin_y + sin * travelled)
        })
    }

    /// Whether every integer offset within `radius` of `(x, y)` is walkable.
    #[must_use]
    pub fn is_disc_walkable(&self, x: f32, y: f32, radius: f32) -> bool {
        let reach = radius.floor() as i64;
        let radius_sq = radius * radius;
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                let (fx, fy) = (dx as f32, dy as f32);
                if fx * fx + fy * fy <= radius_sq && !self.is_walkable(x + fx, y + fy) {
                    return false;
                }
            }
        }
        true
    }

    /// Count of wall cells, border included.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.cells.iter().filter(|&&wall| wall).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    #[test]
    fn border_is_always_wall() {
        let grid = WallGrid::bordered(8, 6, 10.0).expect("grid");
        for col in 0..8 {
            assert!(grid.is_wall(col, 0));
            assert!(grid.is_wall(col, 5));
        }
        for row in 0..6 {
            assert!(grid.is_wall(0, row));
            assert!(grid.is_wall(7, row));
        }
        assert!(!grid.is_wall(3, 3));
        assert_eq!(grid.wall_count(), 2 * 8 + 2 * 4);
    }

    #[test]
    fn walkability_maps_continuous_coordinates() {
        let mut grid = WallGrid::bordered(8, 6, 10.0).expect("grid");
        grid.set_wall(4, 2, true);
        assert!(grid.is_walkable(15.0, 15.0));
        assert!(!grid.is_walkable(5.0, 15.0));
        assert!(!grid.is_walkable(45.0, 25.0));
        assert!(grid.is_walkable(39.9, 25.0));
        assert!(!grid.is_walkable(-1.0, 15.0));
        assert!(!grid.is_walkable(15.0, 600.0));
        assert!(!grid.is_walkable(f32::NAN, 15.0));
    }

    #[test]
    fn border_cells_cannot_be_cleared() {
        let mut grid = WallGrid::bordered(8, 6, 10.0).expect("grid");
        grid.set_wall(0, 3, false);
        grid.set_wall(7, 3, false);
        assert!(grid.is_wall(0, 3));
        assert!(grid.is_wall(7, 3));
    }

    #[test]
    fn raycast_detects_walls_within_range() {
        let mut grid = WallGrid::bordered(20, 20, 10.0).expect("grid");
        for row in 1..19 {
            grid.set_wall(12, row, true);
        }
        assert!(grid.raycast_wall(85.0, 100.0, 0.0, 80.0, 8));
        assert!(!grid.raycast_wall(85.0, 100.0, std::f32::consts::PI, 60.0, 8));
        assert!(!grid.raycast_wall(15.0, 100.0, 0.0, 80.0, 8));
    }

    #[test]
    fn sparse_raycast_can_miss_thin_walls() {
        let mut grid = WallGrid::bordered(40, 10, 10.0).expect("grid");
        grid.set_wall(15, 5, true);
        // Samples at x = 100, 140, 180: the single wall cell at [150, 160) is skipped.
        assert!(!grid.raycast_wall(60.0, 55.0, 0.0, 120.0, 3));
        assert!(grid.raycast_wall(60.0, 55.0, 0.0, 120.0, 12));
    }

    #[test]
    fn disc_check_covers_radius() {
        let mut grid = WallGrid::bordered(20, 20, 10.0).expect("grid");
        assert!(grid.is_disc_walkable(100.0, 100.0, 30.0));
        grid.set_wall(12, 10, true);
        assert!(!grid.is_disc_walkable(100.0, 100.0, 30.0));
        assert!(grid.is_disc_walkable(100.0, 100.0, 15.0));
        assert!(!grid.is_disc_walkable(20.0, 20.0, 15.0));
    }

    #[test]
    fn generation_is_deterministic_and_keeps_border() {
        let config = ColonyConfig::default();
        let a = WallGrid::generate(&config, &mut SmallRng::seed_from_u64(11)).expect("a");
        let b = WallGrid::generate(&config, &mut SmallRng::seed_from_u64(11)).expect("b");
        assert_eq!(a, b);
        assert_eq!(a.cols(), 80);
        assert_eq!(a.rows(), 60);
        let border_only = WallGrid::bordered(80, 60, 10.0).expect("border");
        assert!(a.wall_count() > border_only.wall_count());
        for col in 0..a.cols() {
            assert!(a.is_wall(col, 0) && a.is_wall(col, a.rows() - 1));
        }
    }
}
