//! Error types for the simulation core

use thiserror::Error;

use crate::settings::SettingsError;

/// Failures that abort a tick or prevent the engine from running.
///
/// Geometric degeneracy (parallel motion, zero-length walls) is never an
/// error; it resolves as "no collision".
#[derive(Debug, Error)]
pub enum SimError {
    /// A worker panicked while updating its batch
    #[error("worker for batch {batch} panicked: {message}")]
    WorkerPanicked { batch: usize, message: String },

    /// A particle came out of a tick with broken invariants
    #[error("particle {id} left tick {tick} in an invalid state: {reason}")]
    ParticleInvariant { id: u32, tick: u64, reason: String },

    /// Settings rejected at engine construction
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// The physics worker pool could not be created
    #[error("failed to build physics worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// The driver thread could not be spawned
    #[error("failed to spawn tick driver: {0}")]
    DriverSpawn(#[from] std::io::Error),

    /// The driver thread died without reporting a result
    #[error("tick driver thread panicked")]
    DriverPanicked,

    /// The live particle set was poisoned by an earlier panic
    #[error("simulation state poisoned by an earlier failure")]
    StatePoisoned,
}
