//! Simulation core
//!
//! Everything that touches particle state lives here:
//! - Particles move on a fixed timestep with sub-pixel accumulation
//! - Collisions are pure functions of one particle, the arena and the walls
//! - A tick updates all particles in parallel and publishes a snapshot

pub mod collision;
pub mod dispatch;
pub mod particle;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod wall;

pub use collision::{CollisionResult, reflect, resolve, segment_intersection};
pub use dispatch::{BatchTotals, Dispatcher, TickFrame};
pub use particle::Particle;
pub use spawn::{ParticleSeed, SpawnPattern};
pub use state::{LiveSet, SimulationState, Snapshot};
pub use tick::{TickReport, tick};
pub use wall::{Wall, WallRegistry};
