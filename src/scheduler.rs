//! Tick scheduler
//!
//! A single driver thread runs one tick, then sleeps out the rest of the
//! tick interval. Overruns start the next tick immediately with no catch-up
//! burst. The sleep doubles as the stop signal wait, so a stop request only
//! ever waits for the tick already in flight.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::{SimulationState, tick};

/// Lifecycle of the tick driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    /// Not started yet
    Idle,
    /// Driver thread is ticking
    Running,
    /// Halted by a stop request
    Stopped,
    /// Halted by a failed tick
    Faulted,
}

struct Driver {
    handle: JoinHandle<Result<u64, SimError>>,
    stop_tx: Sender<()>,
}

/// Owner of the driver thread
pub struct Scheduler {
    phase: Arc<Mutex<EnginePhase>>,
    driver: Option<Driver>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("phase", &self.phase())
            .field("driver", &self.driver.is_some())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            phase: Arc::new(Mutex::new(EnginePhase::Idle)),
            driver: None,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: EnginePhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Start ticking `state`
    ///
    /// Returns `Ok(false)` without doing anything if already running.
    pub fn start(&mut self, state: Arc<SimulationState>) -> Result<bool, SimError> {
        if self.phase() == EnginePhase::Running {
            return Ok(false);
        }
        if self.phase() == EnginePhase::Faulted {
            return Err(SimError::StatePoisoned);
        }
        // Reap a driver that was stopped but never joined
        if let Some(driver) = self.driver.take() {
            let _ = driver.handle.join();
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let phase = Arc::clone(&self.phase);
        self.set_phase(EnginePhase::Running);

        let spawned = thread::Builder::new()
            .name("physics-driver".into())
            .spawn(move || drive(&state, &stop_rx, &phase));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.set_phase(EnginePhase::Idle);
                return Err(err.into());
            }
        };

        self.driver = Some(Driver { handle, stop_tx });
        log::info!("Scheduler running");
        Ok(true)
    }

    /// Stop the driver after its in-flight tick and wait for it
    ///
    /// Returns the number of ticks the driver ran, or the error that halted it.
    pub fn stop(&mut self) -> Result<u64, SimError> {
        let Some(driver) = self.driver.take() else {
            return Ok(0);
        };

        // The driver may already have exited on a fault; a closed channel is fine
        let _ = driver.stop_tx.send(());
        let result = driver.handle.join().unwrap_or(Err(SimError::DriverPanicked));

        match &result {
            Ok(ticks) => {
                self.set_phase(EnginePhase::Stopped);
                log::info!("Scheduler stopped after {ticks} ticks");
            }
            Err(err) => {
                self.set_phase(EnginePhase::Faulted);
                log::error!("Scheduler halted: {err}");
            }
        }
        result
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.driver.is_some() {
            let _ = self.stop();
        }
    }
}

/// Driver loop: tick, sleep out the interval, repeat until stopped or failed
fn drive(
    state: &SimulationState,
    stop_rx: &Receiver<()>,
    phase: &Mutex<EnginePhase>,
) -> Result<u64, SimError> {
    let interval = state.settings().tick_interval();
    let summary_every = state.settings().tick_rate_hz.round().max(1.0) as u64;
    let mut ticks = 0u64;

    loop {
        let started = Instant::now();
        let report = match tick(state) {
            Ok(report) => report,
            Err(err) => {
                log::error!("Tick failed, halting scheduler: {err}");
                *phase.lock().unwrap_or_else(PoisonError::into_inner) = EnginePhase::Faulted;
                return Err(err);
            }
        };
        ticks += 1;

        if report.tick % summary_every == 0 {
            log::debug!(
                "Tick {}: {} particles, {} border hits, {} wall hits, {:?}",
                report.tick,
                report.particles,
                report.boundary_hits,
                report.wall_hits,
                report.elapsed
            );
        }

        let remaining = interval.saturating_sub(started.elapsed());
        let stop = if remaining.is_zero() {
            log::debug!("Tick {} overran its {:?} budget", report.tick, interval);
            !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty))
        } else {
            !matches!(stop_rx.recv_timeout(remaining), Err(RecvTimeoutError::Timeout))
        };
        if stop {
            return Ok(ticks);
        }
    }
}
