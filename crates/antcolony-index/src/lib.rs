//! Spatial indexing for ant and pheromone neighborhood queries.
//!
//! The world is cut into square buckets of `cell_size` units. Every bucket keeps
//! two handle lists, one for ants and one for pheromones. The index never owns
//! the entities themselves; callers keep the bucket coordinate returned by
//! [`UniformGridIndex::insert`] and hand it back on removal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors emitted by spatial index implementations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Indicates configuration values that cannot be used (e.g., non-positive cell size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Integer coordinate of a bucket inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketCoord {
    pub x: u32,
    pub y: u32,
}

impl BucketCoord {
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A handle stored in the index, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indexed<A, P> {
    Ant(A),
    Pheromone(P),
}

#[derive(Debug, Clone)]
struct Bucket<A, P> {
    ants: Vec<A>,
    pheromones: Vec<P>,
}

impl<A, P> Default for Bucket<A, P> {
    fn default() -> Self {
        Self {
            ants: Vec::new(),
            pheromones: Vec::new(),
        }
    }
}

/// Uniform bucket grid over world coordinates.
#[derive(Debug, Clone)]
pub struct UniformGridIndex<A, P> {
    cell_size: f32,
    cols: u32,
    rows: u32,
    buckets: Vec<Bucket<A, P>>,
    ant_count: usize,
    pheromone_count: usize,
}

impl<A, P> UniformGridIndex<A, P>
where
    A: Copy + PartialEq,
    P: Copy + PartialEq,
{
    /// Create a grid covering `world_width` x `world_height` with square buckets.
    pub fn new(cell_size: f32, world_width: f32, world_height: f32) -> Result<Self, IndexError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(IndexError::InvalidConfig("cell_size must be positive"));
        }
        if !world_width.is_finite()
            || !world_height.is_finite()
            || world_width <= 0.0
            || world_height <= 0.0
        {
            return Err(IndexError::InvalidConfig(
                "world dimensions must be positive",
            ));
        }
        let cols = (world_width / cell_size).ceil() as u32;
        let rows = (world_height / cell_size).ceil() as u32;
        let mut buckets = Vec::with_capacity(cols as usize * rows as usize);
        buckets.resize_with(cols as usize * rows as usize, Bucket::default);
        Ok(Self {
            cell_size,
            cols,
            rows,
            buckets,
            ant_count: 0,
            pheromone_count: 0,
        })
    }

    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total ant handles currently indexed.
    #[must_use]
    pub const fn ant_count(&self) -> usize {
        self.ant_count
    }

    /// Total pheromone handles currently indexed.
    #[must_use]
    pub const fn pheromone_count(&self) -> usize {
        self.pheromone_count
    }

    /// Signed bucket coordinate for a world position; may lie outside the grid.
    fn raw_coord(&self, x: f32, y: f32) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Bucket containing `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn bucket_of(&self, x: f32, y: f32) -> Option<BucketCoord> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (bx, by) = self.raw_coord(x, y);
        if bx < 0 || by < 0 || bx >= i64::from(self.cols) || by >= i64::from(self.rows) {
            return None;
        }
        Some(BucketCoord::new(bx as u32, by as u32))
    }

    #[inline]
    fn offset(&self, coord: BucketCoord) -> Option<usize> {
        if coord.x < self.cols && coord.y < self.rows {
            Some(coord.y as usize * self.cols as usize + coord.x as usize)
        } else {
            None
        }
    }

    /// Register `entity` at `(x, y)`. Returns the bucket it landed in, or `None`
    /// when the position is outside the grid (the entity is then not indexed).
    pub fn insert(&mut self, entity: Indexed<A, P>, x: f32, y: f32) -> Option<BucketCoord> {
        let coord = self.bucket_of(x, y)?;
        let offset = self.offset(coord)?;
        let bucket = &mut self.buckets[offset];
        match entity {
            Indexed::Ant(id) => {
                bucket.ants.push(id);
                self.ant_count += 1;
            }
            Indexed::Pheromone(id) => {
                bucket.pheromones.push(id);
                self.pheromone_count += 1;
            }
        }
        Some(coord)
    }

    /// Remove `entity` from the bucket at `coord`. Returns whether it was present.
    pub fn remove(&mut self, entity: Indexed<A, P>, coord: BucketCoord) -> bool {
        let Some(offset) = self.offset(coord) else {
            return false;
        };
        let bucket = &mut self.buckets[offset];
        match entity {
            Indexed::Ant(id) => match bucket.ants.iter().position(|&other| other == id) {
                Some(pos) => {
                    bucket.ants.swap_remove(pos);
                    self.ant_count -= 1;
                    true
                }
                None => false,
            },
            Indexed::Pheromone(id) => {
                match bucket.pheromones.iter().position(|&other| other == id) {
                    Some(pos) => {
                        bucket.pheromones.swap_remove(pos);
                        self.pheromone_count -= 1;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Move `entity` from `from` to the bucket matching `(x, y)`.
    ///
    /// Nothing is touched when the bucket does not change.
    pub fn relocate(
        &mut self,
        entity: Indexed<A, P>,
        from: Option<BucketCoord>,
        x: f32,
        y: f32,
    ) -> Option<BucketCoord> {
        let target = self.bucket_of(x, y);
        if target == from {
            return from;
        }
        if let Some(previous) = from {
            self.remove(entity, previous);
        }
        self.insert(entity, x, y)
    }

    /// Inclusive bucket ranges scanned for a query of `radius` around `(x, y)`.
    ///
    /// The span is `ceil(radius / cell_size)` buckets in each direction around the
    /// bucket containing the point, clamped to the grid. `None` when the clamped
    /// span is empty.
    #[must_use]
    pub fn query_span(&self, x: f32, y: f32, radius: f32) -> Option<(BucketCoord, BucketCoord)> {
        if !x.is_finite() || !y.is_finite() || !radius.is_finite() || radius < 0.0 {
            return None;
        }
        // Float arithmetic so huge radii and far points cannot overflow; the
        // center bucket uses the same f32 division as `bucket_of`.
        let reach = f64::from((radius / self.cell_size).ceil());
        let cx = f64::from((x / self.cell_size).floor());
        let cy = f64::from((y / self.cell_size).floor());
        let min_x = (cx - reach).max(0.0);
        let min_y = (cy - reach).max(0.0);
        let max_x = (cx + reach).min(f64::from(self.cols) - 1.0);
        let max_y = (cy + reach).min(f64::from(self.rows) - 1.0);
        if min_x > max_x || min_y > max_y {
            return None;
        }
        Some((
            BucketCoord::new(min_x as u32, min_y as u32),
            BucketCoord::new(max_x as u32, max_y as u32),
        ))
    }

    fn for_each_bucket(&self, x: f32, y: f32, radius: f32, mut visit: impl FnMut(&Bucket<A, P>)) {
        let Some((min, max)) = self.query_span(x, y, radius) else {
            return;
        };
        let cols = self.cols as usize;
        for by in min.y..=max.y {
            let row = by as usize * cols;
            for bx in min.x..=max.x {
                visit(&self.buckets[row + bx as usize]);
            }
        }
    }

    /// Visit every ant handle in the buckets covering `radius` around `(x, y)`.
    ///
    /// Candidates may lie slightly outside `radius`; callers filter by distance.
    pub fn query_ants(&self, x: f32, y: f32, radius: f32, visitor: &mut dyn FnMut(A)) {
        self.for_each_bucket(x, y, radius, |bucket| {
            for &id in &bucket.ants {
                visitor(id);
            }
        });
    }

    /// Visit every pheromone handle in the buckets covering `radius` around `(x, y)`.
    pub fn query_pheromones(&self, x: f32, y: f32, radius: f32, visitor: &mut dyn FnMut(P)) {
        self.for_each_bucket(x, y, radius, |bucket| {
            for &id in &bucket.pheromones {
                visitor(id);
            }
        });
    }

    /// Ant handles stored in a single bucket.
    #[must_use]
    pub fn ants_in(&self, coord: BucketCoord) -> &[A] {
        self.offset(coord)
            .map_or(&[], |offset| self.buckets[offset].ants.as_slice())
    }

    /// Pheromone handles stored in a single bucket.
    #[must_use]
    pub fn pheromones_in(&self, coord: BucketCoord) -> &[P] {
        self.offset(coord)
            .map_or(&[], |offset| self.buckets[offset].pheromones.as_slice())
    }
}
