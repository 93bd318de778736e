//! Core simulation for an ant colony foraging in a walled arena.
//!
//! [`WorldState`] owns every collection (ants, free food, pheromone slots, the
//! spatial index and the wall grid) and advances them one tick at a time with
//! [`WorldState::step`]. Rendering and input live outside this crate; they read
//! the snapshot accessors and push [`ControlCommand`]s.

use antcolony_index::{IndexError, Indexed, UniformGridIndex};
use rand::{Rng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tracing::debug;

mod ant;
mod arena;
mod colony;
mod config;
mod pheromone;

pub use ant::{Ant, AntMode, AntOutcome, limited_turn, signed_angle_difference};
pub use antcolony_index::BucketCoord;
pub use arena::WallGrid;
pub use colony::{
    Food, FoodSupply, Nest, find_open_position, food_cluster, random_point_in_disc,
};
pub use config::ColonyConfig;
pub use pheromone::{Pheromone, PheromoneField, PheromoneId, PheromoneKind};

new_key_type! {
    /// Stable handle for ants.
    pub struct AntId;
    /// Stable handle for food lying in the world.
    pub struct FoodId;
}

/// Spatial index specialised to the colony's handle types.
pub type SpatialIndex = UniformGridIndex<AntId, PheromoneId>;

const FULL_TURN: f32 = std::f32::consts::TAU;
const HALF_TURN: f32 = std::f32::consts::PI;

/// Wrap into `(−π, π]`; non-finite input maps to 0.
fn wrap_signed_angle(angle: f32) -> f32 {
    let unsigned = wrap_unsigned_angle(angle);
    if unsigned > HALF_TURN {
        unsigned - FULL_TURN
    } else {
        unsigned
    }
}

/// Wrap into `[0, 2π)`; non-finite input maps to 0.
fn wrap_unsigned_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(FULL_TURN);
    // rem_euclid can round up to the modulus for tiny negative inputs.
    if wrapped >= FULL_TURN { 0.0 } else { wrapped }
}

/// High level simulation clock (ticks processed since the world was built).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// Point in world units.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Construct a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Errors that can occur when constructing world state.
#[derive(Debug, Error)]
pub enum WorldStateError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A bounded placement search ran out of attempts.
    #[error("could not place {what} after {attempts} attempts")]
    PlacementFailed { what: &'static str, attempts: u32 },
    /// The spatial index rejected the world dimensions.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Counters describing what happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickEvents {
    pub tick: Tick,
    pub pickups: usize,
    pub deliveries: usize,
    pub pheromones_deposited: usize,
    pub pheromones_expired: usize,
    pub wall_avoidances: usize,
}

/// Per-tick population summary retained in the history ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: Tick,
    pub ant_count: usize,
    pub free_food: usize,
    pub carried_food: usize,
    pub active_pheromones: usize,
    pub pooled_pheromones: usize,
    pub deliveries: usize,
    pub delivered_total: u64,
}

/// Population changes requested by an outer shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlCommand {
    /// Spawn ants at random points inside the nest.
    SpawnAnts { count: u32 },
    /// Drop single food items on random cells.
    SpawnFood { count: u32 },
    /// Stamp a food cluster around a point.
    SpawnFoodSupply { x: f32, y: f32 },
}

/// Apply a control command to the world.
pub fn apply_control_command(world: &mut WorldState, command: ControlCommand) {
    match command {
        ControlCommand::SpawnAnts { count } => {
            for _ in 0..count {
                world.spawn_ant();
            }
        }
        ControlCommand::SpawnFood { count } => {
            for _ in 0..count {
                world.spawn_food();
            }
        }
        ControlCommand::SpawnFoodSupply { x, y } => {
            world.spawn_food_supply(Position::new(x, y));
        }
    }
}

/// Render-facing projection of an ant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntView {
    pub id: AntId,
    pub position: Position,
    pub heading: f32,
    pub mode: AntMode,
}

/// Render-facing projection of a live pheromone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PheromoneView {
    pub position: Position,
    pub kind: PheromoneKind,
    pub life_ratio: f32,
    pub radius: f32,
    pub color: [u8; 3],
}

/// Render-facing projection of a free food item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodView {
    pub id: FoodId,
    pub position: Position,
    pub size: f32,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub world_width: u32,
    pub world_height: u32,
    pub nest: Nest,
    pub walls: WallGrid,
    pub ants: Vec<AntView>,
    pub pheromones: Vec<PheromoneView>,
    pub food: Vec<FoodView>,
    pub food_supplies: Vec<FoodSupply>,
    pub delivered_total: u64,
}

/// Aggregate world state advanced by [`WorldState::step`].
pub struct WorldState {
    config: ColonyConfig,
    tick: Tick,
    rng: SmallRng,
    arena: WallGrid,
    nest: Nest,
    index: SpatialIndex,
    ants: SlotMap<AntId, Ant>,
    ant_order: Vec<AntId>,
    food: SlotMap<FoodId, Food>,
    food_supplies: Vec<FoodSupply>,
    pheromones: PheromoneField,
    delivered_total: u64,
    history: VecDeque<TickSummary>,
}

impl fmt::Debug for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldState")
            .field("tick", &self.tick)
            .field("nest", &self.nest)
            .field("ant_count", &self.ants.len())
            .field("food_count", &self.food.len())
            .field("active_pheromones", &self.pheromones.active_count())
            .finish()
    }
}

impl WorldState {
    /// Build a world with generated walls, a placed nest, the initial food
    /// supplies and the initial ants.
    pub fn new(config: ColonyConfig) -> Result<Self, WorldStateError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let arena = WallGrid::generate(&config, &mut rng)?;
        let nest = Nest::place(
            &arena,
            config.nest_radius,
            config.placement_attempts,
            &mut rng,
        )?;
        let mut world = Self::assemble(config, arena, nest, rng)?;

        for _ in 0..world.config.initial_food_supplies {
            let center = find_open_position(
                &world.arena,
                world.config.placement_attempts,
                &mut world.rng,
            )?;
            world.spawn_food_supply(center);
        }
        for _ in 0..world.config.initial_ants {
            world.spawn_ant();
        }
        debug!(
            walls = world.arena.wall_count(),
            food = world.food.len(),
            ants = world.ants.len(),
            "world initialised"
        );
        Ok(world)
    }

    /// Build an empty world around a caller-supplied arena and nest.
    ///
    /// No food supplies or ants are created; the arena must match the
    /// configured world and cell size.
    pub fn with_layout(
        config: ColonyConfig,
        arena: WallGrid,
        nest: Nest,
    ) -> Result<Self, WorldStateError> {
        let (cols, rows) = config.validate()?;
        if arena.cols() != cols
            || arena.rows() != rows
            || arena.cell_size() != config.cell_size as f32
        {
            return Err(WorldStateError::InvalidConfig(
                "arena does not match configured world dimensions",
            ));
        }
        let rng = config.seeded_rng();
        Self::assemble(config, arena, nest, rng)
    }

    fn assemble(
        config: ColonyConfig,
        arena: WallGrid,
        nest: Nest,
        rng: SmallRng,
    ) -> Result<Self, WorldStateError> {
        let index = SpatialIndex::new(
            config.bucket_size,
            config.world_width as f32,
            config.world_height as f32,
        )?;
        let history_capacity = config.history_capacity;
        Ok(Self {
            pheromones: PheromoneField::new(&config),
            config,
            tick: Tick::zero(),
            rng,
            arena,
            nest,
            index,
            ants: SlotMap::with_key(),
            ant_order: Vec::new(),
            food: SlotMap::with_key(),
            food_supplies: Vec::new(),
            delivered_total: 0,
            history: VecDeque::with_capacity(history_capacity),
        })
    }

    fn stage_ants(&mut self, events: &mut TickEvents) {
        for slot in 0..self.ant_order.len() {
            let id = self.ant_order[slot];
            let Some(ant) = self.ants.get_mut(id) else {
                continue;
            };
            let mut ctx = ant::AntContext {
                config: &self.config,
                arena: &self.arena,
                nest: &self.nest,
                food: &mut self.food,
                pheromones: &mut self.pheromones,
                index: &mut self.index,
                rng: &mut self.rng,
            };
            let outcome = ant::advance_ant(id, ant, &mut ctx);
            if outcome.picked_up.is_some() {
                events.pickups += 1;
            }
            if outcome.delivered {
                events.deliveries += 1;
            }
            if outcome.deposited.is_some() {
                events.pheromones_deposited += 1;
            }
            if outcome.avoided_wall {
                events.wall_avoidances += 1;
            }
        }
        self.delivered_total += events.deliveries as u64;
    }

    fn stage_pheromone_decay(&mut self, events: &mut TickEvents) {
        events.pheromones_expired = self.pheromones.decay(&mut self.index);
    }

    fn stage_history(&mut self, events: &TickEvents) {
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(TickSummary {
            tick: events.tick,
            ant_count: self.ants.len(),
            free_food: self.food.len(),
            carried_food: self.carrying_count(),
            active_pheromones: self.pheromones.active_count(),
            pooled_pheromones: self.pheromones.pooled_count(),
            deliveries: events.deliveries,
            delivered_total: self.delivered_total,
        });
    }

    /// Execute one simulation tick: every ant in spawn order, then pheromone decay.
    pub fn step(&mut self) -> TickEvents {
        let next_tick = self.tick.next();
        let mut events = TickEvents {
            tick: next_tick,
            ..TickEvents::default()
        };
        self.stage_ants(&mut events);
        self.stage_pheromone_decay(&mut events);
        self.tick = next_tick;
        self.stage_history(&events);
        events
    }

    /// Spawn an ant at a random point in the nest with a random heading.
    pub fn spawn_ant(&mut self) -> AntId {
        let position = self.nest.random_point_inside(&mut self.rng);
        let heading = self.rng.gen_range(0.0..FULL_TURN);
        self.insert_ant(Ant::new(position, heading, self.config.ant_speed))
    }

    /// Insert a fully specified ant; it is updated after every existing ant.
    pub fn insert_ant(&mut self, mut ant: Ant) -> AntId {
        ant.bucket = None;
        let id = self.ants.insert(ant);
        let bucket = self
            .index
            .insert(Indexed::Ant(id), ant.position.x, ant.position.y);
        if let Some(stored) = self.ants.get_mut(id) {
            stored.bucket = bucket;
        }
        self.ant_order.push(id);
        id
    }

    /// Drop one food item at the center of a random cell.
    pub fn spawn_food(&mut self) -> FoodId {
        let cell = self.arena.cell_size();
        let col = self.rng.gen_range(0..self.arena.cols());
        let row = self.rng.gen_range(0..self.arena.rows());
        self.place_food(Position::new(
            col as f32 * cell + cell * 0.5,
            row as f32 * cell + cell * 0.5,
        ))
    }

    /// Put a free food item at an exact position.
    pub fn place_food(&mut self, position: Position) -> FoodId {
        self.food.insert(Food::new(position))
    }

    /// Drop a trail marker of `kind` at an exact position, as an ant would.
    pub fn deposit_pheromone(&mut self, position: Position, kind: PheromoneKind) -> PheromoneId {
        self.pheromones
            .deposit(&mut self.index, position.x, position.y, kind)
    }

    /// Stamp `food_per_supply` items around `center`. Returns how many were added.
    pub fn spawn_food_supply(&mut self, center: Position) -> usize {
        let radius = self.config.food_supply_radius;
        let count = self.config.food_per_supply;
        let before = self.food.len();
        for food in food_cluster(center, radius, count, &mut self.rng) {
            self.food.insert(food);
        }
        let added = self.food.len() - before;
        self.food_supplies.push(FoodSupply { center, radius });
        debug!(x = center.x, y = center.y, added, "food supply spawned");
        added
    }

    /// Returns an immutable reference to configuration.
    #[must_use]
    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    #[must_use]
    pub fn arena(&self) -> &WallGrid {
        &self.arena
    }

    #[must_use]
    pub fn nest(&self) -> &Nest {
        &self.nest
    }

    #[must_use]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    #[must_use]
    pub fn pheromones(&self) -> &PheromoneField {
        &self.pheromones
    }

    #[must_use]
    pub fn ant(&self, id: AntId) -> Option<&Ant> {
        self.ants.get(id)
    }

    /// Ants in update order.
    pub fn ants(&self) -> impl Iterator<Item = (AntId, &Ant)> + '_ {
        self.ant_order
            .iter()
            .filter_map(|&id| self.ants.get(id).map(|ant| (id, ant)))
    }

    #[must_use]
    pub fn food(&self, id: FoodId) -> Option<&Food> {
        self.food.get(id)
    }

    /// Every food supply stamped so far, in creation order.
    #[must_use]
    pub fn food_supplies(&self) -> &[FoodSupply] {
        &self.food_supplies
    }

    /// Free food items.
    pub fn foods(&self) -> impl Iterator<Item = (FoodId, &Food)> + '_ {
        self.food.iter()
    }

    #[must_use]
    pub fn ant_count(&self) -> usize {
        self.ants.len()
    }

    /// Free food items lying in the world.
    #[must_use]
    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    /// Ants currently carrying food.
    #[must_use]
    pub fn carrying_count(&self) -> usize {
        self.ants
            .values()
            .filter(|ant| ant.carrying.is_some())
            .count()
    }

    /// Food items delivered to the nest since the world was built.
    #[must_use]
    pub const fn delivered_total(&self) -> u64 {
        self.delivered_total
    }

    /// Iterate over retained tick summaries.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }

    /// Ants registered in the index buckets covering `radius` around `(x, y)`,
    /// filtered to those actually within `radius`.
    #[must_use]
    pub fn ants_near(&self, x: f32, y: f32, radius: f32) -> Vec<AntId> {
        let origin = Position::new(x, y);
        let mut found = Vec::new();
        self.index.query_ants(x, y, radius, &mut |id| {
            if self
                .ants
                .get(id)
                .is_some_and(|ant| ant.position.distance(origin) <= radius)
            {
                found.push(id);
            }
        });
        found
    }

    pub fn ant_views(&self) -> impl Iterator<Item = AntView> + '_ {
        self.ants().map(|(id, ant)| AntView {
            id,
            position: ant.position,
            heading: ant.heading,
            mode: ant.mode(),
        })
    }

    pub fn pheromone_views(&self) -> impl Iterator<Item = PheromoneView> + '_ {
        let base = self.config.pheromone_size;
        self.pheromones
            .iter_active()
            .map(move |(_, pheromone)| PheromoneView {
                position: pheromone.position,
                kind: pheromone.kind,
                life_ratio: pheromone.life_ratio(),
                radius: pheromone.display_radius(base),
                color: pheromone.kind.color(),
            })
    }

    pub fn food_views(&self) -> impl Iterator<Item = FoodView> + '_ {
        let size = self.arena.cell_size();
        self.food.iter().map(move |(id, food)| FoodView {
            id,
            position: food.position,
            size,
        })
    }

    /// Copy of everything a renderer draws.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            world_width: self.config.world_width,
            world_height: self.config.world_height,
            nest: self.nest,
            walls: self.arena.clone(),
            ants: self.ant_views().collect(),
            pheromones: self.pheromone_views().collect(),
            food: self.food_views().collect(),
            food_supplies: self.food_supplies.clone(),
            delivered_total: self.delivered_total,
        }
    }
}
