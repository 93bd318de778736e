//! Pheromone trail markers and their recycling pool.
//!
//! Markers live in a slot vector. Expired slots are pushed on a free stack and
//! handed back out by the next deposit; every reuse bumps the slot generation so
//! stale [`PheromoneId`] handles resolve to nothing.

use crate::{ColonyConfig, Position, SpatialIndex};
use antcolony_index::{BucketCoord, Indexed};
use serde::{Deserialize, Serialize};

/// Trail type, chosen by the depositing ant's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PheromoneKind {
    /// Dropped by ants still looking for food; repels other seekers.
    Seeking,
    /// Dropped by ants carrying food home; attracts seekers.
    Returning,
}

impl PheromoneKind {
    /// Ticks a fresh marker of this kind survives.
    #[must_use]
    pub fn lifetime(self, config: &ColonyConfig) -> u32 {
        match self {
            Self::Seeking => config.seeking_lifetime,
            Self::Returning => config.returning_lifetime,
        }
    }

    /// Signed steering gain: positive pulls seekers toward the marker, negative pushes them away.
    #[must_use]
    pub fn steering_gain(self, config: &ColonyConfig) -> f32 {
        match self {
            Self::Seeking => -config.seek_pheromone_repulsion,
            Self::Returning => config.return_pheromone_strength,
        }
    }

    /// Display colour for rendering shells.
    #[must_use]
    pub const fn color(self) -> [u8; 3] {
        match self {
            Self::Seeking => [200, 0, 200],
            Self::Returning => [0, 200, 0],
        }
    }
}

/// Generational handle to a pheromone slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PheromoneId {
    index: u32,
    generation: u32,
}

impl PheromoneId {
    /// Slot index backing this handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// A single trail marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pheromone {
    pub position: Position,
    pub kind: PheromoneKind,
    pub lifetime: u32,
    pub initial_lifetime: u32,
    pub bucket: Option<BucketCoord>,
}

impl Pheromone {
    /// Remaining strength in `[0, 1]`.
    #[must_use]
    pub fn life_ratio(&self) -> f32 {
        if self.initial_lifetime == 0 {
            return 0.0;
        }
        (self.lifetime as f32 / self.initial_lifetime as f32).max(0.0)
    }

    /// Render radius, shrinking linearly with the remaining strength.
    #[must_use]
    pub fn display_radius(&self, base_size: f32) -> f32 {
        base_size * self.life_ratio()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    live: bool,
    pheromone: Pheromone,
}

/// Owner of every pheromone slot, active or pooled.
#[derive(Debug, Clone)]
pub struct PheromoneField {
    seeking_lifetime: u32,
    returning_lifetime: u32,
    slots: Vec<Slot>,
    free: Vec<u32>,
    active: Vec<PheromoneId>,
}

impl PheromoneField {
    #[must_use]
    pub fn new(config: &ColonyConfig) -> Self {
        Self {
            seeking_lifetime: PheromoneKind::Seeking.lifetime(config),
            returning_lifetime: PheromoneKind::Returning.lifetime(config),
            slots: Vec::new(),
            free: Vec::new(),
            active: Vec::new(),
        }
    }

    fn lifetime_of(&self, kind: PheromoneKind) -> u32 {
        match kind {
            PheromoneKind::Seeking => self.seeking_lifetime,
            PheromoneKind::Returning => self.returning_lifetime,
        }
    }

    /// Drop a marker at `(x, y)`, reusing a pooled slot when one is available.
    pub fn deposit(
        &mut self,
        index: &mut SpatialIndex,
        x: f32,
        y: f32,
        kind: PheromoneKind,
    ) -> PheromoneId {
        let lifetime = self.lifetime_of(kind);
        let fresh = Pheromone {
            position: Position::new(x, y),
            kind,
            lifetime,
            initial_lifetime: lifetime,
            bucket: None,
        };

        let id = match self.free.pop() {
            Some(slot_index) => {
                let slot = &mut self.slots[slot_index as usize];
                debug_assert!(!slot.live, "pooled slot still live");
                slot.generation = slot.generation.wrapping_add(1);
                slot.live = true;
                slot.pheromone = fresh;
                PheromoneId {
                    index: slot_index,
                    generation: slot.generation,
                }
            }
            None => {
                let slot_index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    live: true,
                    pheromone: fresh,
                });
                PheromoneId {
                    index: slot_index,
                    generation: 0,
                }
            }
        };

        let bucket = index.insert(Indexed::Pheromone(id), x, y);
        self.slots[id.index as usize].pheromone.bucket = bucket;
        self.active.push(id);
        id
    }

    /// Age every active marker by one tick, recycling those that reach zero.
    ///
    /// Returns the number of markers that expired.
    pub fn decay(&mut self, index: &mut SpatialIndex) -> usize {
        let mut expired = 0;
        let slots = &mut self.slots;
        let free = &mut self.free;
        self.active.retain(|&id| {
            let slot = &mut slots[id.index as usize];
            let pheromone = &mut slot.pheromone;
            pheromone.lifetime = pheromone.lifetime.saturating_sub(1);
            if pheromone.lifetime > 0 {
                return true;
            }
            if let Some(bucket) = pheromone.bucket.take() {
                index.remove(Indexed::Pheromone(id), bucket);
            }
            slot.live = false;
            free.push(id.index);
            expired += 1;
            false
        });
        expired
    }

    /// Resolve a handle; `None` once the marker has expired.
    #[must_use]
    pub fn get(&self, id: PheromoneId) -> Option<&Pheromone> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.live && slot.generation == id.generation)
            .map(|slot| &slot.pheromone)
    }

    /// Active markers in deposit order.
    pub fn iter_active(&self) -> impl Iterator<Item = (PheromoneId, &Pheromone)> + '_ {
        self.active
            .iter()
            .map(|&id| (id, &self.slots[id.index as usize].pheromone))
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Expired slots waiting for reuse.
    #[must_use]
    pub fn pooled_count(&self) -> usize {
        self.free.len()
    }

    /// Total slots ever allocated.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
