//! Configuration bundle for a colony world.

use crate::WorldStateError;
use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

/// Static configuration for a colony world.
///
/// Every field is fixed once the world is built. Defaults reproduce the
/// classic 800x600 arena with 10-unit cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColonyConfig {
    /// Width of the world in world units.
    pub world_width: u32,
    /// Height of the world in world units.
    pub world_height: u32,
    /// Edge length of one wall-grid cell in world units.
    pub cell_size: u32,
    /// Edge length of one spatial-index bucket in world units.
    pub bucket_size: f32,
    /// Number of random wall segments stamped into the interior.
    pub wall_segments: u32,
    /// Shortest wall segment, in cells.
    pub wall_min_length: u32,
    /// Longest wall segment, in cells.
    pub wall_max_length: u32,
    /// Distance travelled by an ant each tick.
    pub ant_speed: f32,
    /// Footprint of an ant; its center is kept half this far from the world edge.
    pub ant_size: f32,
    /// Maximum heading change per tick, in radians.
    pub max_turn_rate: f32,
    /// Turn gain applied while returning to the nest.
    pub nest_return_strength: f32,
    /// Turn gain while seeking, also the maximum immediate pull toward sensed food.
    pub food_attraction_strength: f32,
    /// Uniform wander range (radians) applied when nothing is sensed.
    pub random_turn_factor: f32,
    /// Radius of the nest disc.
    pub nest_radius: f32,
    /// Lifetime of pheromones dropped while seeking, in ticks.
    pub seeking_lifetime: u32,
    /// Lifetime of pheromones dropped while returning, in ticks.
    pub returning_lifetime: u32,
    /// Ticks between pheromone drops for each ant.
    pub pheromone_interval: u32,
    /// Base render radius of a fresh pheromone.
    pub pheromone_size: f32,
    /// Radius within which ants sense pheromones.
    pub pheromone_attraction_radius: f32,
    /// Pull toward returning-trail pheromones.
    pub return_pheromone_strength: f32,
    /// Push away from seeking-trail pheromones.
    pub seek_pheromone_repulsion: f32,
    /// Radius within which ants sense free food.
    pub food_sense_radius: f32,
    /// Distance at which a seeking ant picks food up.
    pub food_pickup_distance: f32,
    /// Length of the wall sensor rays.
    pub wall_sensor_distance: f32,
    /// Number of samples taken along each wall ray.
    pub wall_ray_samples: u32,
    /// Sensor fan (offsets from the heading, radians) cast for wall detection.
    pub wall_sensor_angles: Vec<f32>,
    /// Offset of the diagonal sensors used to pick a clear side.
    pub wall_diagonal_angle: f32,
    /// Food items stamped by each food supply.
    pub food_per_supply: u32,
    /// Radius of the disc food supplies scatter their items over.
    pub food_supply_radius: f32,
    /// Food supplies created with the world.
    pub initial_food_supplies: u32,
    /// Ants spawned with the world.
    pub initial_ants: u32,
    /// Attempts made when searching for an open position before giving up.
    pub placement_attempts: u32,
    /// Maximum number of recent tick summaries retained in-memory.
    pub history_capacity: usize,
    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            world_width: 800,
            world_height: 600,
            cell_size: 10,
            bucket_size: 50.0,
            wall_segments: 50,
            wall_min_length: 3,
            wall_max_length: 7,
            ant_speed: 0.5,
            ant_size: 10.0,
            max_turn_rate: 0.2,
            nest_return_strength: 0.3,
            food_attraction_strength: 1.0,
            random_turn_factor: 0.2,
            nest_radius: 30.0,
            seeking_lifetime: 300,
            returning_lifetime: 400,
            pheromone_interval: 5,
            pheromone_size: 3.0,
            pheromone_attraction_radius: 30.0,
            return_pheromone_strength: 0.15,
            seek_pheromone_repulsion: 0.05,
            food_sense_radius: 50.0,
            food_pickup_distance: 10.0,
            wall_sensor_distance: 80.0,
            wall_ray_samples: 8,
            wall_sensor_angles: vec![-0.8, -0.4, -0.52, 0.0, 0.52, 0.4, 0.8],
            wall_diagonal_angle: 0.52,
            food_per_supply: 100,
            food_supply_radius: 30.0,
            initial_food_supplies: 2,
            initial_ants: 0,
            placement_attempts: 10_000,
            history_capacity: 256,
            rng_seed: None,
        }
    }
}

impl ColonyConfig {
    /// Validates the configuration, returning the wall grid dimensions in cells.
    pub fn validate(&self) -> Result<(u32, u32), WorldStateError> {
        if self.world_width == 0 || self.world_height == 0 {
            return Err(WorldStateError::InvalidConfig(
                "world dimensions must be non-zero",
            ));
        }
        if self.cell_size == 0 {
            return Err(WorldStateError::InvalidConfig("cell_size must be non-zero"));
        }
        let dims = (
            self.world_width / self.cell_size,
            self.world_height / self.cell_size,
        );
        if dims.0 < 3 || dims.1 < 3 {
            return Err(WorldStateError::InvalidConfig(
                "world must span at least 3x3 cells",
            ));
        }
        if !(self.bucket_size.is_finite() && self.bucket_size > 0.0) {
            return Err(WorldStateError::InvalidConfig(
                "bucket_size must be positive",
            ));
        }
        if self.wall_min_length == 0 || self.wall_min_length > self.wall_max_length {
            return Err(WorldStateError::InvalidConfig(
                "wall lengths must satisfy 0 < min <= max",
            ));
        }
        if !(self.ant_speed >= 0.0) || !(self.ant_size >= 0.0) {
            return Err(WorldStateError::InvalidConfig(
                "ant_speed and ant_size must be non-negative",
            ));
        }
        if !(self.max_turn_rate > 0.0) {
            return Err(WorldStateError::InvalidConfig(
                "max_turn_rate must be positive",
            ));
        }
        if !(self.nest_return_strength > 0.0 && self.nest_return_strength <= 1.0)
            || !(self.food_attraction_strength > 0.0 && self.food_attraction_strength <= 1.0)
        {
            return Err(WorldStateError::InvalidConfig(
                "turn gains must lie in (0, 1]",
            ));
        }
        if self.seeking_lifetime == 0 || self.returning_lifetime == 0 {
            return Err(WorldStateError::InvalidConfig(
                "pheromone lifetimes must be non-zero",
            ));
        }
        if self.pheromone_interval == 0 {
            return Err(WorldStateError::InvalidConfig(
                "pheromone_interval must be non-zero",
            ));
        }
        if !(self.nest_radius > 0.0)
            || !(self.pheromone_attraction_radius > 0.0)
            || !(self.food_sense_radius > 0.0)
            || !(self.food_pickup_distance > 0.0)
            || !(self.wall_sensor_distance > 0.0)
            || !(self.food_supply_radius >= 0.0)
        {
            return Err(WorldStateError::InvalidConfig(
                "sensing radii and distances must be positive",
            ));
        }
        if self.random_turn_factor < 0.0
            || self.return_pheromone_strength < 0.0
            || self.seek_pheromone_repulsion < 0.0
            || self.pheromone_size < 0.0
        {
            return Err(WorldStateError::InvalidConfig(
                "wander and pheromone strengths must be non-negative",
            ));
        }
        if self.wall_ray_samples == 0 {
            return Err(WorldStateError::InvalidConfig(
                "wall_ray_samples must be non-zero",
            ));
        }
        if self.placement_attempts == 0 || self.history_capacity == 0 {
            return Err(WorldStateError::InvalidConfig(
                "placement_attempts and history_capacity must be non-zero",
            ));
        }
        Ok(dims)
    }

    /// Returns the configured RNG seed, generating one from entropy if absent.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}
