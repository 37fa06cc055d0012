//! Collision detection and reflection
//!
//! Pure functions over one particle, the arena bounds and the wall list.
//! Nothing here can fail: parallel motion and zero-length walls simply
//! report no collision.

use glam::DVec2;

use super::particle::Particle;
use super::wall::Wall;
use crate::heading_angle;
use crate::settings::ArenaSettings;

/// What a single `resolve` call did to a particle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionResult {
    /// Reflected off the left/right border
    pub boundary_x: bool,
    /// Reflected off the top/bottom border
    pub boundary_y: bool,
    /// Index (registration order) of the wall that reflected the particle
    pub wall: Option<usize>,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self::default()
    }

    pub fn hit(&self) -> bool {
        self.boundary_x || self.boundary_y || self.wall.is_some()
    }
}

/// Reflect a vector off a surface with unit normal `normal`
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect(v: DVec2, normal: DVec2) -> DVec2 {
    v - 2.0 * v.dot(normal) * normal
}

/// Intersection parameters of segments p1→p2 and p3→p4
///
/// Returns `(t, u)` when both lie in [0, 1]. A zero denominator (parallel or
/// degenerate segments) is no intersection.
pub fn segment_intersection(p1: DVec2, p2: DVec2, p3: DVec2, p4: DVec2) -> Option<(f64, f64)> {
    let denominator = (p1.x - p2.x) * (p3.y - p4.y) - (p1.y - p2.y) * (p3.x - p4.x);
    if denominator == 0.0 {
        return None;
    }

    let t = ((p1.x - p3.x) * (p3.y - p4.y) - (p1.y - p3.y) * (p3.x - p4.x)) / denominator;
    let u = ((p2.x - p1.x) * (p1.y - p3.y) - (p2.y - p1.y) * (p1.x - p3.x)) / denominator;

    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some((t, u))
}

/// Keep a particle inside the arena, reflecting off any border it crossed
///
/// An axis triggers when the position leaves `[buffer, bound - diameter - buffer]`.
/// The particle is reflected only when it is still heading outward, then
/// clamped back onto the allowed range. Both axes are checked independently,
/// so a corner hit reflects twice in one call.
pub fn boundary_collision(particle: &mut Particle, arena: &ArenaSettings) -> (bool, bool) {
    let dir = particle.direction();
    let mut hit_x = false;
    let mut hit_y = false;

    if particle.pos.x < arena.min_x() {
        if dir.x < 0.0 {
            particle.reflect_horizontal();
            hit_x = true;
        }
        particle.pos.x = arena.min_x();
    } else if particle.pos.x > arena.max_x() {
        if dir.x > 0.0 {
            particle.reflect_horizontal();
            hit_x = true;
        }
        particle.pos.x = arena.max_x();
    }

    if particle.pos.y < arena.min_y() {
        if dir.y < 0.0 {
            particle.reflect_vertical();
            hit_y = true;
        }
        particle.pos.y = arena.min_y();
    } else if particle.pos.y > arena.max_y() {
        if dir.y > 0.0 {
            particle.reflect_vertical();
            hit_y = true;
        }
        particle.pos.y = arena.max_y();
    }

    (hit_x, hit_y)
}

/// Whether the particle's predictive segment crosses `wall` while heading into it
///
/// The segment runs from the current position to where the particle would be
/// after `lookahead` seconds. Whether the particle is heading into the wall is
/// judged from where it started the step: it must have started strictly on one
/// side and be moving toward the other. A particle that started on the wall
/// line (after a bounce settled it there) is leaving and is not hit again.
pub fn hits_wall(particle: &Particle, wall: &Wall, lookahead: f64) -> bool {
    let start = particle.pos.as_dvec2();
    let end = start + particle.velocity() * lookahead;
    let a = wall.start.as_dvec2();
    let b = wall.end.as_dvec2();

    if segment_intersection(start, end, a, b).is_none() {
        return false;
    }

    let normal = wall.normal();
    let side = (particle.from() - a).dot(normal);
    let approach = particle.direction().dot(normal);
    side * approach < 0.0
}

/// Reflect the particle's heading off `wall`
///
/// Sub-pixel motion is dropped so the particle restarts from its integer
/// position rather than a fraction of a pixel beyond the wall.
pub fn reflect_off_wall(particle: &mut Particle, wall: &Wall) {
    let reflected = reflect(particle.direction(), wall.normal());
    particle.set_angle(heading_angle(reflected));
    particle.settle();
}

/// Resolve all collisions for one particle after it has advanced
///
/// Border first, then walls in registration order. Only the first wall that
/// is hit is honored; later walls on the same path wait for the next tick.
pub fn resolve(
    particle: &mut Particle,
    arena: &ArenaSettings,
    walls: &[Wall],
    lookahead: f64,
) -> CollisionResult {
    let (boundary_x, boundary_y) = boundary_collision(particle, arena);

    let wall = walls.iter().position(|wall| hits_wall(particle, wall, lookahead));
    if let Some(index) = wall {
        reflect_off_wall(particle, &walls[index]);
    }

    CollisionResult {
        boundary_x,
        boundary_y,
        wall,
    }
}
