//! Fixed timestep simulation tick
//!
//! One tick: take the live set exclusively, fold in queued spawns, run the
//! parallel update, publish a snapshot.

use std::time::{Duration, Instant};

use super::dispatch::TickFrame;
use super::state::{SimulationState, Snapshot};
use crate::error::SimError;

/// Summary of one completed tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Tick number (1-based)
    pub tick: u64,
    /// Particles updated this tick
    pub particles: usize,
    /// Particles picked up from the spawn inbox at tick start
    pub spawned: usize,
    pub batches: usize,
    pub boundary_hits: u32,
    pub wall_hits: u32,
    /// Wall-clock time spent inside the tick
    pub elapsed: Duration,
}

/// Advance the simulation by one fixed timestep
///
/// Ticks are serialized by the live-set lock, so two callers can never
/// overlap. A failed tick marks the state faulted and every later tick is
/// refused.
pub fn tick(state: &SimulationState) -> Result<TickReport, SimError> {
    let started = Instant::now();
    let mut live = state.lock_live()?;
    if live.faulted {
        return Err(SimError::StatePoisoned);
    }

    let spawned = state.take_spawns();
    let spawned_count = spawned.len();
    live.particles.extend(spawned);

    let walls = state.walls().snapshot();
    let settings = state.settings();
    let tick = live.tick + 1;
    let frame = TickFrame {
        tick,
        arena: &settings.arena,
        walls: &walls,
        dt: settings.physics_dt,
        lookahead: settings.reference_frame_time,
    };

    let live = &mut *live;
    let totals = match live.dispatcher.run(&mut live.particles, &frame) {
        Ok(totals) => totals,
        Err(err) => {
            live.faulted = true;
            return Err(err);
        }
    };
    live.tick = tick;

    state.publish(Snapshot {
        tick,
        particles: live.particles.clone(),
        walls,
    });

    Ok(TickReport {
        tick,
        particles: live.particles.len(),
        spawned: spawned_count,
        batches: totals.batches,
        boundary_hits: totals.boundary_hits,
        wall_hits: totals.wall_hits,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;
    use crate::settings::Settings;
    use crate::sim::{SpawnPattern, Wall};

    fn state() -> SimulationState {
        let settings = Settings {
            workers: Some(4),
            ..Default::default()
        };
        SimulationState::new(settings).expect("state")
    }

    #[test]
    fn test_tick_picks_up_spawns_and_publishes() {
        let state = state();
        state.spawn(&SpawnPattern::Line {
            count: 10,
            start: IVec2::new(100, 100),
            end: IVec2::new(1000, 600),
            angle: 30.0,
            speed: 200.0,
        });
        state.add_wall(Wall::new(640, 0, 640, 720));

        let report = tick(&state).expect("tick");
        assert_eq!(report.tick, 1);
        assert_eq!(report.spawned, 10);
        assert_eq!(report.particles, 10);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.particles.len(), 10);
        assert_eq!(snapshot.walls.len(), 1);

        let report = tick(&state).expect("tick");
        assert_eq!(report.tick, 2);
        assert_eq!(report.spawned, 0);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_ticks() {
        let state = state();
        state.spawn(&SpawnPattern::SpeedSweep {
            count: 4,
            pos: IVec2::new(300, 300),
            angle: 0.0,
            speed_start: 240.0,
            speed_end: 960.0,
        });
        tick(&state).expect("tick");
        let held = state.snapshot();
        let before: Vec<_> = held.particles.iter().map(|p| p.pos).collect();

        for _ in 0..50 {
            tick(&state).expect("tick");
        }
        let after: Vec<_> = held.particles.iter().map(|p| p.pos).collect();
        assert_eq!(before, after);
        assert_ne!(state.snapshot().particles[0].pos, held.particles[0].pos);
    }

    #[test]
    fn test_failed_tick_faults_state() {
        let state = state();
        state.spawn(&SpawnPattern::Line {
            count: 1,
            start: IVec2::new(100, 100),
            end: IVec2::new(100, 100),
            angle: 0.0,
            speed: f64::INFINITY,
        });
        let err = tick(&state).unwrap_err();
        assert!(matches!(err, SimError::ParticleInvariant { id: 0, tick: 1, .. }));
        assert!(matches!(tick(&state), Err(SimError::StatePoisoned)));
        // Nothing half-updated was published
        assert_eq!(state.snapshot().tick, 0);
    }
}
