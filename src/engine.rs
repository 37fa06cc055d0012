//! Simulation facade
//!
//! The entry point for rendering and input layers. All methods take `&self`
//! so one `Simulation` can be shared between an input thread, a render
//! thread and the tick driver.

use std::sync::{Arc, Mutex, PoisonError};

use glam::IVec2;

use crate::error::SimError;
use crate::scheduler::{EnginePhase, Scheduler};
use crate::settings::Settings;
use crate::sim::{SimulationState, Snapshot, SpawnPattern, TickReport, Wall, tick};

/// A running (or ready to run) particle simulation
#[derive(Debug)]
pub struct Simulation {
    state: Arc<SimulationState>,
    scheduler: Mutex<Scheduler>,
}

impl Simulation {
    pub fn new(settings: Settings) -> Result<Self, SimError> {
        Ok(Self {
            state: Arc::new(SimulationState::new(settings)?),
            scheduler: Mutex::new(Scheduler::new()),
        })
    }

    pub fn settings(&self) -> &Settings {
        self.state.settings()
    }

    /// Queue a spawn pattern; returns the number of particles added
    pub fn spawn(&self, pattern: SpawnPattern) -> usize {
        let added = self.state.spawn(&pattern);
        log::debug!("Queued {added} particles: {pattern:?}");
        added
    }

    /// `count` particles evenly spaced from (x1, y1) to (x2, y2)
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_point(
        &self,
        count: u32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        angle: f64,
        speed: f64,
    ) -> usize {
        self.spawn(SpawnPattern::Line {
            count,
            start: IVec2::new(x1, y1),
            end: IVec2::new(x2, y2),
            angle,
            speed,
        })
    }

    /// `count` particles at (x, y) with angles from `angle_start` to `angle_end`
    pub fn spawn_angle_sweep(
        &self,
        count: u32,
        x: i32,
        y: i32,
        angle_start: f64,
        angle_end: f64,
        speed: f64,
    ) -> usize {
        self.spawn(SpawnPattern::AngleSweep {
            count,
            pos: IVec2::new(x, y),
            angle_start,
            angle_end,
            speed,
        })
    }

    /// `count` particles at (x, y) with speeds from `speed_start` to `speed_end`
    pub fn spawn_speed_sweep(
        &self,
        count: u32,
        x: i32,
        y: i32,
        angle: f64,
        speed_start: f64,
        speed_end: f64,
    ) -> usize {
        self.spawn(SpawnPattern::SpeedSweep {
            count,
            pos: IVec2::new(x, y),
            angle,
            speed_start,
            speed_end,
        })
    }

    pub fn add_wall(&self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let wall = Wall::new(x1, y1, x2, y2);
        self.state.add_wall(wall);
        log::debug!("Added wall {:?} -> {:?}", wall.start, wall.end);
    }

    /// Start the tick driver (no-op if already running)
    pub fn start(&self) -> Result<(), SimError> {
        self.scheduler().start(Arc::clone(&self.state)).map(|_| ())
    }

    /// Stop the tick driver after its in-flight tick
    ///
    /// Returns the ticks run since the last start, or the error that halted
    /// the driver.
    pub fn stop(&self) -> Result<u64, SimError> {
        self.scheduler().stop()
    }

    /// Run one tick on the calling thread
    ///
    /// Safe to call while the driver is running; ticks are serialized.
    pub fn step(&self) -> Result<TickReport, SimError> {
        tick(&self.state)
    }

    /// Particles as of the last completed tick plus every wall added so far
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.snapshot()
    }

    pub fn phase(&self) -> EnginePhase {
        self.scheduler().phase()
    }

    /// Particles in the last snapshot plus those waiting for the next tick
    pub fn particle_count(&self) -> usize {
        self.state.snapshot().particles.len() + self.state.pending_spawns()
    }

    pub fn wall_count(&self) -> usize {
        self.state.walls().len()
    }

    fn scheduler(&self) -> std::sync::MutexGuard<'_, Scheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
