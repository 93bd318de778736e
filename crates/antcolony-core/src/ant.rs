//! Per-ant sensing and steering.
//!
//! Each tick an ant blends four heading sources (nest bearing, pheromone field,
//! nearest food, random wander), lets wall avoidance override the result, turns
//! toward the target by at most `max_turn_rate`, walks forward and periodically
//! drops a pheromone.

use crate::{
    AntId, ColonyConfig, Food, FoodId, Nest, PheromoneField, PheromoneKind, Position,
    SpatialIndex, WallGrid, wrap_signed_angle, wrap_unsigned_angle,
};
use antcolony_index::{BucketCoord, Indexed};
use ordered_float::OrderedFloat;
use rand::{Rng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::f32::consts::FRAC_PI_2;
use tracing::trace;

/// Pheromone sums below this magnitude are treated as no signal.
const PHEROMONE_SIGNAL_EPSILON: f32 = 1e-3;
/// Distances below this are too small to yield a bearing.
const DISTANCE_EPSILON: f32 = 1e-6;

/// Behavioural mode, derived from whether the ant carries food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AntMode {
    Seeking,
    Returning,
}

impl AntMode {
    /// Trail type dropped while in this mode.
    #[must_use]
    pub const fn trail(self) -> PheromoneKind {
        match self {
            Self::Seeking => PheromoneKind::Seeking,
            Self::Returning => PheromoneKind::Returning,
        }
    }
}

/// A single forager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ant {
    pub position: Position,
    /// Heading in radians, kept in `[0, 2π)`.
    pub heading: f32,
    pub speed: f32,
    pub pheromone_timer: u32,
    pub carrying: Option<Food>,
    #[serde(skip)]
    pub(crate) bucket: Option<BucketCoord>,
}

impl Ant {
    #[must_use]
    pub fn new(position: Position, heading: f32, speed: f32) -> Self {
        Self {
            position,
            heading: wrap_unsigned_angle(heading),
            speed,
            pheromone_timer: 0,
            carrying: None,
            bucket: None,
        }
    }

    /// Builder-style helper giving the ant a food item to carry.
    #[must_use]
    pub fn carrying(mut self, food: Food) -> Self {
        self.carrying = Some(food);
        self
    }

    #[must_use]
    pub const fn mode(&self) -> AntMode {
        if self.carrying.is_some() {
            AntMode::Returning
        } else {
            AntMode::Seeking
        }
    }

    /// Spatial-index bucket the ant is currently registered in.
    #[must_use]
    pub const fn bucket(&self) -> Option<BucketCoord> {
        self.bucket
    }
}

/// Shortest signed rotation from `current` to `target`, in `(−π, π]`.
#[must_use]
pub fn signed_angle_difference(target: f32, current: f32) -> f32 {
    wrap_signed_angle(target - current)
}

/// Rate-limited turn toward `target`: the signed difference clamped to
/// `max_turn` and scaled by `gain`.
#[must_use]
pub fn limited_turn(current: f32, target: f32, max_turn: f32, gain: f32) -> f32 {
    let diff = signed_angle_difference(target, current);
    if diff == 0.0 {
        return 0.0;
    }
    diff.signum() * diff.abs().min(max_turn) * gain
}

fn bearing(from: Position, to: Position) -> Option<(f32, f32)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let distance = dx.hypot(dy);
    if distance < DISTANCE_EPSILON {
        None
    } else {
        Some((dy.atan2(dx), distance))
    }
}

/// What happened to one ant during a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AntOutcome {
    pub picked_up: Option<FoodId>,
    pub delivered: bool,
    pub deposited: Option<PheromoneKind>,
    pub avoided_wall: bool,
}

/// Borrowed world parts an ant reads and mutates during its update.
pub(crate) struct AntContext<'a> {
    pub config: &'a ColonyConfig,
    pub arena: &'a WallGrid,
    pub nest: &'a Nest,
    pub food: &'a mut SlotMap<FoodId, Food>,
    pub pheromones: &'a mut PheromoneField,
    pub index: &'a mut SpatialIndex,
    pub rng: &'a mut SmallRng,
}

impl AntContext<'_> {
    /// Summed pheromone pull at `origin`; `None` when the signal is negligible.
    fn pheromone_heading(&self, origin: Position) -> Option<f32> {
        let radius = self.config.pheromone_attraction_radius;
        let field = &*self.pheromones;
        let config = self.config;
        let mut sum_x = 0.0_f32;
        let mut sum_y = 0.0_f32;
        self.index
            .query_pheromones(origin.x, origin.y, radius, &mut |id| {
                let Some(pheromone) = field.get(id) else {
                    return;
                };
                let dx = pheromone.position.x - origin.x;
                let dy = pheromone.position.y - origin.y;
                let distance = dx.hypot(dy);
                if distance < DISTANCE_EPSILON || distance >= radius {
                    return;
                }
                let weight = (1.0 - distance / radius) * pheromone.kind.steering_gain(config);
                sum_x += dx / distance * weight;
                sum_y += dy / distance * weight;
            });
        if sum_x.hypot(sum_y) > PHEROMONE_SIGNAL_EPSILON {
            Some(sum_y.atan2(sum_x))
        } else {
            None
        }
    }

    /// Nearest free food strictly inside the sense radius.
    fn nearest_food(&self, origin: Position) -> Option<(FoodId, f32)> {
        let radius = self.config.food_sense_radius;
        self.food
            .iter()
            .map(|(id, food)| (id, origin.distance(food.position)))
            .filter(|&(_, distance)| distance < radius)
            .min_by_key(|&(_, distance)| OrderedFloat(distance))
    }

    /// Target heading forced by a nearby wall, if any sensor in the fan hits.
    fn wall_avoidance(&mut self, origin: Position, heading: f32) -> Option<f32> {
        let config = self.config;
        let arena = self.arena;
        let reach = config.wall_sensor_distance;
        let samples = config.wall_ray_samples;
        let diagonal = config.wall_diagonal_angle;
        let hits = |offset: f32| {
            arena.raycast_wall(origin.x, origin.y, heading + offset, reach, samples)
        };

        if !config.wall_sensor_angles.iter().any(|&offset| hits(offset)) {
            return None;
        }
        let left_clear = !hits(-diagonal);
        let right_clear = !hits(diagonal);
        let side = match (left_clear, right_clear) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => {
                if self.rng.gen_bool(0.5) {
                    -1.0
                } else {
                    1.0
                }
            }
        };
        Some(heading + side * FRAC_PI_2)
    }
}

/// Advance one ant by a tick.
pub(crate) fn advance_ant(id: AntId, ant: &mut Ant, ctx: &mut AntContext<'_>) -> AntOutcome {
    let config = ctx.config;
    let mut outcome = AntOutcome::default();
    let mut desired = ant.heading;

    if ant.carrying.is_some() {
        if ctx.nest.contains(ant.position) {
            ant.carrying = None;
            outcome.delivered = true;
            trace!(?id, x = ant.position.x, y = ant.position.y, "food delivered");
            return outcome;
        }
        if let Some((angle, _)) = bearing(ant.position, ctx.nest.position) {
            desired = angle;
        }
    } else {
        let pheromone_heading = ctx.pheromone_heading(ant.position);
        if let Some(angle) = pheromone_heading {
            desired = angle;
        }

        match ctx.nearest_food(ant.position) {
            Some((food_id, distance)) if distance < config.food_pickup_distance => {
                if let Some(food) = ctx.food.remove(food_id) {
                    ant.carrying = Some(food);
                    outcome.picked_up = Some(food_id);
                    desired = ant.heading;
                    trace!(?id, ?food_id, "food picked up");
                }
            }
            Some((food_id, _)) => {
                if let Some((angle, _)) = ctx
                    .food
                    .get(food_id)
                    .and_then(|food| bearing(ant.position, food.position))
                {
                    desired = angle;
                    let pull = signed_angle_difference(angle, ant.heading).clamp(
                        -config.food_attraction_strength,
                        config.food_attraction_strength,
                    );
                    ant.heading = wrap_unsigned_angle(ant.heading + pull);
                }
            }
            None if pheromone_heading.is_none() => {
                let half = config.random_turn_factor * 0.5;
                if half > 0.0 {
                    desired += ctx.rng.gen_range(-half..=half);
                }
            }
            None => {}
        }
    }

    let wall_target = ctx.wall_avoidance(ant.position, ant.heading);
    outcome.avoided_wall = wall_target.is_some();
    let target = wall_target.unwrap_or(desired);

    let gain = match ant.mode() {
        AntMode::Returning => config.nest_return_strength,
        AntMode::Seeking => config.food_attraction_strength,
    };
    let turn = limited_turn(ant.heading, target, config.max_turn_rate, gain);
    ant.heading = wrap_unsigned_angle(ant.heading + turn);

    let (sin, cos) = ant.heading.sin_cos();
    let half_size = config.ant_size * 0.5;
    let max_x = (config.world_width as f32 - half_size).max(half_size);
    let max_y = (config.world_height as f32 - half_size).max(half_size);
    ant.position.x = (ant.position.x + cos * ant.speed).clamp(half_size, max_x);
    ant.position.y = (ant.position.y + sin * ant.speed).clamp(half_size, max_y);

    ant.pheromone_timer += 1;
    if ant.pheromone_timer >= config.pheromone_interval {
        let kind = ant.mode().trail();
        ctx.pheromones
            .deposit(ctx.index, ant.position.x, ant.position.y, kind);
        ant.pheromone_timer = 0;
        outcome.deposited = Some(kind);
    }

    ant.bucket = ctx
        .index
        .relocate(Indexed::Ant(id), ant.bucket, ant.position.x, ant.position.y);
    outcome
}
