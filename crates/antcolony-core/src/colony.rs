//! Nest placement and food items.

use crate::{Position, WallGrid, WorldStateError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::debug;

/// Point sampled with a uniform angle and a uniform radius.
///
/// This clusters samples toward the center compared to an area-uniform disc.
pub fn random_point_in_disc(center: Position, radius: f32, rng: &mut impl Rng) -> Position {
    let angle = rng.gen_range(0.0..TAU);
    let distance = if radius > 0.0 {
        rng.gen_range(0.0..radius)
    } else {
        0.0
    };
    Position::new(
        center.x + angle.cos() * distance,
        center.y + angle.sin() * distance,
    )
}

/// Cell-aligned open position at least two cells from the border.
///
/// Gives up after `attempts` samples.
pub fn find_open_position(
    arena: &WallGrid,
    attempts: u32,
    rng: &mut impl Rng,
) -> Result<Position, WorldStateError> {
    let cell = arena.cell_size();
    if arena.cols() <= 4 || arena.rows() <= 4 {
        return Err(WorldStateError::PlacementFailed {
            what: "open position",
            attempts: 0,
        });
    }
    for _ in 0..attempts {
        let col = rng.gen_range(2..arena.cols() - 2);
        let row = rng.gen_range(2..arena.rows() - 2);
        let candidate = Position::new(col as f32 * cell, row as f32 * cell);
        if arena.is_walkable(candidate.x, candidate.y) {
            return Ok(candidate);
        }
    }
    Err(WorldStateError::PlacementFailed {
        what: "open position",
        attempts,
    })
}

/// The colony's home: spawn origin and drop-off target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nest {
    pub position: Position,
    pub radius: f32,
}

impl Nest {
    #[must_use]
    pub const fn new(position: Position, radius: f32) -> Self {
        Self { position, radius }
    }

    /// Search the arena for a spot whose whole disc is free of walls.
    pub fn place(
        arena: &WallGrid,
        radius: f32,
        attempts: u32,
        rng: &mut impl Rng,
    ) -> Result<Self, WorldStateError> {
        for attempt in 1..=attempts {
            let Ok(candidate) = find_open_position(arena, 1, rng) else {
                continue;
            };
            if arena.is_disc_walkable(candidate.x, candidate.y, radius) {
                debug!(
                    x = candidate.x,
                    y = candidate.y,
                    attempt,
                    "placed nest"
                );
                return Ok(Self::new(candidate, radius));
            }
        }
        Err(WorldStateError::PlacementFailed {
            what: "nest",
            attempts,
        })
    }

    /// Random spawn point inside the nest disc.
    pub fn random_point_inside(&self, rng: &mut impl Rng) -> Position {
        random_point_in_disc(self.position, self.radius, rng)
    }

    /// Distance from `point` to the nest center.
    #[must_use]
    pub fn distance_to(&self, point: Position) -> f32 {
        self.position.distance(point)
    }

    /// Whether `point` lies inside the nest disc, edge included.
    #[must_use]
    pub fn contains(&self, point: Position) -> bool {
        self.distance_to(point) <= self.radius
    }
}

/// One unit of food, either lying in the world or carried by an ant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub position: Position,
}

impl Food {
    #[must_use]
    pub const fn new(position: Position) -> Self {
        Self { position }
    }
}

/// Where a food cluster was stamped. Kept for drawing only; the items it
/// produced are not tracked back to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodSupply {
    pub center: Position,
    pub radius: f32,
}

/// Scatter `count` food items uniformly (by angle and radius) around `center`.
pub fn food_cluster(
    center: Position,
    radius: f32,
    count: u32,
    rng: &mut impl Rng,
) -> impl Iterator<Item = Food> + '_ {
    (0..count).map(move |_| Food::new(random_point_in_disc(center, radius, &mut *rng)))
}
