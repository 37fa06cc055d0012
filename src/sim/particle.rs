//! Particle kinematics
//!
//! Positions are whole pixels; motion smaller than a pixel is carried in a
//! per-particle residual so slow particles still move at their true speed.

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

use crate::{heading, normalize_degrees};

/// A point particle moving at constant speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    /// Authoritative (rendered) position in pixels
    pub pos: IVec2,
    /// Sub-pixel motion not yet applied to `pos`
    pub residual: DVec2,
    /// Direction of travel in degrees, always in [0, 360)
    angle: f64,
    /// Pixels per second
    pub speed: f64,
    /// Exact position at the start of the last `advance`
    #[serde(skip)]
    from: DVec2,
}

impl Particle {
    pub fn new(id: u32, pos: IVec2, angle: f64, speed: f64) -> Self {
        Self {
            id,
            pos,
            residual: DVec2::ZERO,
            angle: normalize_degrees(angle),
            speed,
            from: pos.as_dvec2(),
        }
    }

    /// Direction of travel in degrees
    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Set the direction of travel (normalized to [0, 360))
    #[inline]
    pub fn set_angle(&mut self, angle: f64) {
        self.angle = normalize_degrees(angle);
    }

    /// Unit direction of travel
    #[inline]
    pub fn direction(&self) -> DVec2 {
        heading(self.angle)
    }

    /// Velocity in pixels per second
    #[inline]
    pub fn velocity(&self) -> DVec2 {
        self.direction() * self.speed
    }

    /// Exact (sub-pixel) position
    #[inline]
    pub fn exact_pos(&self) -> DVec2 {
        self.pos.as_dvec2() + self.residual
    }

    /// Exact position before the most recent step
    #[inline]
    pub fn from(&self) -> DVec2 {
        self.from
    }

    /// Drop any sub-pixel motion so the exact position is `pos` again
    #[inline]
    pub fn settle(&mut self) {
        self.residual = DVec2::ZERO;
    }

    /// Move by one timestep
    ///
    /// Once either axis has accumulated a whole pixel, both axes are rounded
    /// into `pos` and the fractional remainder stays in the residual.
    pub fn advance(&mut self, dt: f64) {
        self.from = self.exact_pos();
        self.residual += self.velocity() * dt;

        if self.residual.x.abs() >= 1.0 || self.residual.y.abs() >= 1.0 {
            let step = self.residual.round();
            self.pos = self.pos.saturating_add(step.as_ivec2());
            self.residual -= step;
        }
    }

    /// Bounce off a vertical surface (left/right border)
    #[inline]
    pub fn reflect_horizontal(&mut self) {
        self.set_angle(180.0 - self.angle);
    }

    /// Bounce off a horizontal surface (top/bottom border)
    #[inline]
    pub fn reflect_vertical(&mut self) {
        self.set_angle(-self.angle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_angle() {
        let p = Particle::new(1, IVec2::ZERO, -45.0, 10.0);
        assert_eq!(p.angle(), 315.0);
        let p = Particle::new(1, IVec2::ZERO, 720.0, 10.0);
        assert_eq!(p.angle(), 0.0);
    }

    #[test]
    fn test_slow_particle_accumulates() {
        // 30 px/s at 240 Hz = 0.125 px per tick: 8 ticks per pixel
        let mut p = Particle::new(1, IVec2::new(10, 10), 0.0, 30.0);
        for _ in 0..7 {
            p.advance(1.0 / 240.0);
        }
        assert_eq!(p.pos, IVec2::new(10, 10));
        p.advance(1.0 / 240.0);
        p.advance(1.0 / 240.0);
        assert_eq!(p.pos, IVec2::new(11, 10));
        assert!(p.residual.x.abs() < 1.0);
    }

    #[test]
    fn test_displacement_never_drifts() {
        let dt = 1.0 / 240.0;
        let mut p = Particle::new(1, IVec2::new(0, 0), 30.0, 77.7);
        let ticks = 10_000;
        for _ in 0..ticks {
            p.advance(dt);
        }
        let expected = heading(30.0) * 77.7 * dt * ticks as f64;
        let actual = p.pos.as_dvec2();
        assert!((actual.x - expected.x).abs() <= 1.0, "{actual} vs {expected}");
        assert!((actual.y - expected.y).abs() <= 1.0, "{actual} vs {expected}");
        // Exact position tracks the ideal line to float precision
        assert!((p.exact_pos() - expected).length() < 1e-6);
    }

    #[test]
    fn test_reflections_keep_speed() {
        let mut p = Particle::new(1, IVec2::ZERO, 30.0, 50.0);
        p.reflect_horizontal();
        assert!((p.angle() - 150.0).abs() < 1e-9);
        p.reflect_vertical();
        assert!((p.angle() - 210.0).abs() < 1e-9);
        assert_eq!(p.speed, 50.0);
    }
}
