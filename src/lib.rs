//! Particle Arena - concurrent fixed-timestep particle simulation
//!
//! Core modules:
//! - `sim`: Particles, walls, collision/reflection and the per-tick dispatch
//! - `scheduler`: Driver thread issuing ticks at a fixed rate
//! - `engine`: Thread-safe facade consumed by rendering/input layers
//! - `settings`: Arena and timing configuration

pub mod engine;
pub mod error;
pub mod scheduler;
pub mod settings;
pub mod sim;

pub use engine::Simulation;
pub use error::SimError;
pub use scheduler::EnginePhase;
pub use settings::{ArenaSettings, Settings, SettingsError};

use glam::DVec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed physics timestep passed to every particle advance (seconds)
    pub const SIM_DT: f64 = 1.0 / 240.0;
    /// Scheduler tick rate (ticks per wall-clock second)
    pub const TICK_RATE_HZ: f64 = 240.0;
    /// Nominal frame interval used for the predictive wall segment
    pub const REFERENCE_FRAME_TIME: f64 = 1.0 / 60.0;

    /// Arena dimensions (logical canvas pixels)
    pub const ARENA_WIDTH: i32 = 1280;
    pub const ARENA_HEIGHT: i32 = 720;

    /// Particle visual diameter used for boundary math
    pub const PARTICLE_DIAMETER: i32 = 5;
    /// Gap kept between a reflected particle and the border
    pub const BOUNDARY_BUFFER: i32 = 1;

    /// Seed for batch shuffling
    pub const SHUFFLE_SEED: u64 = 0x5EED_0F_A11;
}

/// Normalize an angle in degrees to [0, 360)
///
/// NaN is passed through untouched so invariant checks can catch it.
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit direction vector for an angle in degrees
#[inline]
pub fn heading(angle_degrees: f64) -> DVec2 {
    let radians = angle_degrees.to_radians();
    DVec2::new(radians.cos(), radians.sin())
}

/// Angle in degrees (normalized to [0, 360)) of a direction vector
#[inline]
pub fn heading_angle(dir: DVec2) -> f64 {
    normalize_degrees(dir.y.atan2(dir.x).to_degrees())
}

/// Linear interpolation between `start` and `end` for item `i` of `count`
///
/// `count <= 1` always yields `start`.
#[inline]
pub fn lerp_step(start: f64, end: f64, i: u32, count: u32) -> f64 {
    if count <= 1 {
        return start;
    }
    start + (end - start) * f64::from(i) / f64::from(count - 1)
}
