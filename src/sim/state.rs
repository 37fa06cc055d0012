//! Shared simulation state
//!
//! Three pieces with separate locks:
//! - the live particle set, held exclusively for the whole of a tick
//! - the spawn inbox, where new particles wait until the next tick starts
//! - the published snapshot, an immutable copy swapped in after every tick
//!
//! Spawning never waits on a running tick and readers never see a
//! half-updated particle set.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::Serialize;

use super::dispatch::Dispatcher;
use super::particle::Particle;
use super::spawn::SpawnPattern;
use super::wall::{Wall, WallRegistry};
use crate::error::SimError;
use crate::settings::Settings;

/// Immutable view of the simulation after a completed tick
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Number of completed ticks
    pub tick: u64,
    /// Particles in id order
    pub particles: Vec<Particle>,
    /// Walls in registration order
    pub walls: Arc<Vec<Wall>>,
}

/// Particle set owned by the tick in progress
#[derive(Debug)]
pub struct LiveSet {
    /// Particles in id order
    pub particles: Vec<Particle>,
    /// Completed ticks
    pub tick: u64,
    pub dispatcher: Dispatcher,
    /// Set once a tick fails; the set may be partially advanced
    pub faulted: bool,
}

/// Particles queued by spawn calls
#[derive(Debug, Default)]
struct SpawnInbox {
    next_id: u32,
    pending: Vec<Particle>,
}

/// Complete shared state of one simulation
#[derive(Debug)]
pub struct SimulationState {
    settings: Settings,
    live: Mutex<LiveSet>,
    inbox: Mutex<SpawnInbox>,
    walls: WallRegistry,
    published: RwLock<Arc<Snapshot>>,
}

impl SimulationState {
    pub fn new(settings: Settings) -> Result<Self, SimError> {
        settings.validate()?;
        let dispatcher = Dispatcher::from_settings(&settings)?;

        Ok(Self {
            settings,
            live: Mutex::new(LiveSet {
                particles: Vec::new(),
                tick: 0,
                dispatcher,
                faulted: false,
            }),
            inbox: Mutex::new(SpawnInbox::default()),
            walls: WallRegistry::new(),
            published: RwLock::new(Arc::new(Snapshot::default())),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn walls(&self) -> &WallRegistry {
        &self.walls
    }

    /// Queue every particle of `pattern` for the next tick
    ///
    /// Returns the number of particles queued. Ids are never reused, so once
    /// `u32::MAX` ids have been handed out further particles are dropped.
    pub fn spawn(&self, pattern: &SpawnPattern) -> usize {
        let mut inbox = self.inbox.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inbox.pending.len();
        for seed in pattern.seeds() {
            let id = inbox.next_id;
            let Some(next_id) = id.checked_add(1) else {
                log::warn!("Particle ids exhausted, dropping the rest of {pattern:?}");
                break;
            };
            inbox.next_id = next_id;
            inbox.pending.push(Particle::new(id, seed.pos, seed.angle, seed.speed));
        }
        inbox.pending.len() - before
    }

    /// Particles spawned but not yet picked up by a tick
    pub fn pending_spawns(&self) -> usize {
        self.inbox.lock().unwrap_or_else(PoisonError::into_inner).pending.len()
    }

    /// Drain the inbox (called at tick start, under the live lock)
    pub fn take_spawns(&self) -> Vec<Particle> {
        std::mem::take(&mut self.inbox.lock().unwrap_or_else(PoisonError::into_inner).pending)
    }

    pub fn add_wall(&self, wall: Wall) {
        self.walls.add(wall);
    }

    /// Exclusive access to the live set for one tick
    pub fn lock_live(&self) -> Result<MutexGuard<'_, LiveSet>, SimError> {
        self.live.lock().map_err(|_| SimError::StatePoisoned)
    }

    /// Particles as of the last completed tick, with every wall added so far
    ///
    /// Walls added since that tick are folded into a refreshed snapshot, which
    /// replaces the published one unless a tick has published in the meantime.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let published = Arc::clone(&self.published.read().unwrap_or_else(PoisonError::into_inner));
        let walls = self.walls.snapshot();
        if Arc::ptr_eq(&published.walls, &walls) {
            return published;
        }

        let refreshed = Arc::new(Snapshot {
            tick: published.tick,
            particles: published.particles.clone(),
            walls,
        });
        let mut slot = self.published.write().unwrap_or_else(PoisonError::into_inner);
        if Arc::ptr_eq(&slot, &published) {
            *slot = Arc::clone(&refreshed);
        }
        refreshed
    }

    /// Replace the published snapshot
    pub fn publish(&self, snapshot: Snapshot) {
        *self.published.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }
}
