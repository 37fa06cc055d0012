//! Wall segments and the append-only wall registry
//!
//! Walls are immutable once added. The registry is copy-on-write: an append
//! swaps in a new `Arc<Vec<Wall>>`, so a tick that already holds the previous
//! list keeps reading it undisturbed.

use std::sync::{Arc, PoisonError, RwLock};

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

/// An immutable line-segment obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    pub start: IVec2,
    pub end: IVec2,
}

impl Wall {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            start: IVec2::new(x1, y1),
            end: IVec2::new(x2, y2),
        }
    }

    /// Direction vector from start to end (not normalized)
    #[inline]
    pub fn direction(&self) -> DVec2 {
        (self.end - self.start).as_dvec2()
    }

    /// Zero-length walls can never be hit
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    /// Unit normal: the direction rotated by 90 degrees, `(dy, -dx)`
    ///
    /// Zero for a degenerate wall.
    pub fn normal(&self) -> DVec2 {
        let d = self.direction();
        DVec2::new(d.y, -d.x).normalize_or_zero()
    }
}

/// Append-only, concurrently readable wall list
#[derive(Debug, Default)]
pub struct WallRegistry {
    walls: RwLock<Arc<Vec<Wall>>>,
}

impl WallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a wall; readers holding an older list are unaffected
    pub fn add(&self, wall: Wall) {
        // Walls are plain data, so a poisoned lock still holds a valid list
        let mut guard = self.walls.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend_from_slice(&guard);
        next.push(wall);
        *guard = Arc::new(next);
    }

    /// Current walls in registration order
    pub fn snapshot(&self) -> Arc<Vec<Wall>> {
        Arc::clone(&self.walls.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.walls.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
