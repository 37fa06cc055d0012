//! Simulation settings
//!
//! Loaded from a JSON file by the headless runner; missing fields fall back
//! to the defaults in [`crate::consts`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Fixed arena geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    /// Logical canvas width in pixels
    pub width: i32,
    /// Logical canvas height in pixels
    pub height: i32,
    /// Particle visual diameter
    pub particle_diameter: i32,
    /// Gap kept between a clamped particle and the border
    pub buffer: i32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            particle_diameter: PARTICLE_DIAMETER,
            buffer: BOUNDARY_BUFFER,
        }
    }
}

impl ArenaSettings {
    /// Smallest allowed x coordinate after a tick
    #[inline]
    pub fn min_x(&self) -> i32 {
        self.buffer
    }

    /// Largest allowed x coordinate after a tick
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.width - self.particle_diameter - self.buffer
    }

    #[inline]
    pub fn min_y(&self) -> i32 {
        self.buffer
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.height - self.particle_diameter - self.buffer
    }

    /// Whether an integer position satisfies the post-tick containment invariant
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.min_x()..=self.max_x()).contains(&x) && (self.min_y()..=self.max_y()).contains(&y)
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub arena: ArenaSettings,

    // === Timing ===
    /// Ticks issued per wall-clock second
    pub tick_rate_hz: f64,
    /// Logical timestep handed to every particle advance (seconds)
    pub physics_dt: f64,
    /// Look-ahead interval for the predictive wall segment (seconds)
    pub reference_frame_time: f64,

    // === Dispatch ===
    /// Worker threads per tick (None = available hardware parallelism)
    pub workers: Option<usize>,
    /// Randomize batch membership every tick
    pub shuffle_batches: bool,
    /// Seed for batch shuffling
    pub shuffle_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena: ArenaSettings::default(),
            tick_rate_hz: TICK_RATE_HZ,
            physics_dt: SIM_DT,
            reference_frame_time: REFERENCE_FRAME_TIME,
            workers: None,
            shuffle_batches: true,
            shuffle_seed: SHUFFLE_SEED,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file and validate them
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Parse settings from a JSON string and validate them
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn positive(field: &'static str, value: f64) -> Result<(), SettingsError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SettingsError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }

        positive("tick_rate_hz", self.tick_rate_hz)?;
        positive("physics_dt", self.physics_dt)?;
        positive("reference_frame_time", self.reference_frame_time)?;

        let arena = &self.arena;
        if arena.particle_diameter < 0 || arena.buffer < 0 {
            return Err(SettingsError::Invalid {
                field: "arena",
                reason: "diameter and buffer must not be negative".into(),
            });
        }
        if arena.max_x() < arena.min_x() || arena.max_y() < arena.min_y() {
            return Err(SettingsError::Invalid {
                field: "arena",
                reason: format!(
                    "{}x{} arena has no room for a particle of diameter {} with buffer {}",
                    arena.width, arena.height, arena.particle_diameter, arena.buffer
                ),
            });
        }
        if self.workers == Some(0) {
            return Err(SettingsError::Invalid {
                field: "workers",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Wall-clock interval between tick starts
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }

    /// Worker count resolved against the host
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.arena.max_x(), 1280 - 5 - 1);
        assert_eq!(settings.arena.max_y(), 720 - 5 - 1);
        assert!(settings.resolved_workers() >= 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "tick_rate_hz": 60.0, "arena": { "width": 640 } }"#)
            .expect("valid settings");
        assert_eq!(settings.tick_rate_hz, 60.0);
        assert_eq!(settings.arena.width, 640);
        assert_eq!(settings.arena.height, ARENA_HEIGHT);
        assert_eq!(settings.physics_dt, SIM_DT);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = Settings::from_json(r#"{ "physics_dt": 0.0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "physics_dt", .. }));

        let err = Settings::from_json(r#"{ "workers": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "workers", .. }));

        let err = Settings::from_json(r#"{ "arena": { "width": 4 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "arena", .. }));

        assert!(matches!(
            Settings::from_json("not json").unwrap_err(),
            SettingsError::Json(_)
        ));
    }

    #[test]
    fn test_contains() {
        let arena = ArenaSettings::default();
        assert!(arena.contains(1, 1));
        assert!(arena.contains(1274, 714));
        assert!(!arena.contains(0, 100));
        assert!(!arena.contains(100, 715));
    }
}
