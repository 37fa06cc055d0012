//! Particle spawn patterns
//!
//! Each pattern expands into `count` particle seeds interpolated between two
//! values. Inputs are assumed to be validated by the caller; a zero count
//! produces nothing.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::lerp_step;

/// Position, angle and speed for a particle about to be created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSeed {
    pub pos: IVec2,
    pub angle: f64,
    pub speed: f64,
}

/// How a batch of particles is laid out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnPattern {
    /// Evenly spaced along a line, shared angle and speed
    Line {
        count: u32,
        start: IVec2,
        end: IVec2,
        angle: f64,
        speed: f64,
    },
    /// One point, angles swept from `angle_start` to `angle_end`
    AngleSweep {
        count: u32,
        pos: IVec2,
        angle_start: f64,
        angle_end: f64,
        speed: f64,
    },
    /// One point and angle, speeds swept from `speed_start` to `speed_end`
    SpeedSweep {
        count: u32,
        pos: IVec2,
        angle: f64,
        speed_start: f64,
        speed_end: f64,
    },
}

impl SpawnPattern {
    pub fn count(&self) -> u32 {
        match *self {
            SpawnPattern::Line { count, .. }
            | SpawnPattern::AngleSweep { count, .. }
            | SpawnPattern::SpeedSweep { count, .. } => count,
        }
    }

    /// Seed for the `i`-th particle of the pattern
    pub fn seed(&self, i: u32) -> ParticleSeed {
        match *self {
            SpawnPattern::Line {
                count,
                start,
                end,
                angle,
                speed,
            } => {
                // Truncate toward zero onto the pixel grid
                let x = lerp_step(f64::from(start.x), f64::from(end.x), i, count) as i32;
                let y = lerp_step(f64::from(start.y), f64::from(end.y), i, count) as i32;
                ParticleSeed {
                    pos: IVec2::new(x, y),
                    angle,
                    speed,
                }
            }
            SpawnPattern::AngleSweep {
                count,
                pos,
                angle_start,
                angle_end,
                speed,
            } => ParticleSeed {
                pos,
                angle: lerp_step(angle_start, angle_end, i, count),
                speed,
            },
            SpawnPattern::SpeedSweep {
                count,
                pos,
                angle,
                speed_start,
                speed_end,
            } => ParticleSeed {
                pos,
                angle,
                speed: lerp_step(speed_start, speed_end, i, count),
            },
        }
    }

    /// All seeds of the pattern, in order
    pub fn seeds(&self) -> impl Iterator<Item = ParticleSeed> + '_ {
        (0..self.count()).map(move |i| self.seed(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_single_particle_at_start() {
        let pattern = SpawnPattern::Line {
            count: 1,
            start: IVec2::new(10, 20),
            end: IVec2::new(500, 600),
            angle: 45.0,
            speed: 100.0,
        };
        let seeds: Vec<_> = pattern.seeds().collect();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].pos, IVec2::new(10, 20));
    }

    #[test]
    fn test_line_evenly_spaced() {
        let pattern = SpawnPattern::Line {
            count: 4,
            start: IVec2::new(0, 0),
            end: IVec2::new(10, 30),
            angle: 0.0,
            speed: 50.0,
        };
        let positions: Vec<_> = pattern.seeds().map(|s| s.pos).collect();
        assert_eq!(
            positions,
            vec![
                IVec2::new(0, 0),
                IVec2::new(3, 10),
                IVec2::new(6, 20),
                IVec2::new(10, 30),
            ]
        );
        assert!(pattern.seeds().all(|s| s.angle == 0.0 && s.speed == 50.0));
    }

    #[test]
    fn test_angle_sweep() {
        let pattern = SpawnPattern::AngleSweep {
            count: 5,
            pos: IVec2::new(640, 360),
            angle_start: 0.0,
            angle_end: 360.0,
            speed: 80.0,
        };
        let angles: Vec<_> = pattern.seeds().map(|s| s.angle).collect();
        assert_eq!(angles, vec![0.0, 90.0, 180.0, 270.0, 360.0]);
    }

    #[test]
    fn test_speed_sweep() {
        let pattern = SpawnPattern::SpeedSweep {
            count: 3,
            pos: IVec2::new(5, 5),
            angle: 10.0,
            speed_start: 100.0,
            speed_end: 300.0,
        };
        let speeds: Vec<_> = pattern.seeds().map(|s| s.speed).collect();
        assert_eq!(speeds, vec![100.0, 200.0, 300.0]);

        let single = SpawnPattern::SpeedSweep {
            count: 1,
            pos: IVec2::new(5, 5),
            angle: 10.0,
            speed_start: 100.0,
            speed_end: 300.0,
        };
        assert_eq!(single.seeds().next().map(|s| s.speed), Some(100.0));
    }

    #[test]
    fn test_zero_count_is_empty() {
        let pattern = SpawnPattern::AngleSweep {
            count: 0,
            pos: IVec2::ZERO,
            angle_start: 0.0,
            angle_end: 90.0,
            speed: 1.0,
        };
        assert_eq!(pattern.seeds().count(), 0);
    }
}
