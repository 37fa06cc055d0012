//! Parallel per-tick particle update
//!
//! The particle set is split into disjoint batches, one per worker, and every
//! batch runs advance + resolve on a dedicated rayon pool. The call returns
//! only after every batch has finished.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::collision::{CollisionResult, resolve};
use super::particle::Particle;
use super::wall::Wall;
use crate::error::SimError;
use crate::settings::{ArenaSettings, Settings};

/// Fixed inputs shared by every batch of one tick
#[derive(Debug, Clone, Copy)]
pub struct TickFrame<'a> {
    pub tick: u64,
    pub arena: &'a ArenaSettings,
    pub walls: &'a [Wall],
    pub dt: f64,
    pub lookahead: f64,
}

/// Collision counts gathered across batches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTotals {
    pub batches: usize,
    pub boundary_hits: u32,
    pub wall_hits: u32,
}

impl BatchTotals {
    fn record(&mut self, result: &CollisionResult) {
        self.boundary_hits += u32::from(result.boundary_x) + u32::from(result.boundary_y);
        self.wall_hits += u32::from(result.wall.is_some());
    }

    fn merge(&mut self, other: BatchTotals) {
        self.batches += other.batches;
        self.boundary_hits += other.boundary_hits;
        self.wall_hits += other.wall_hits;
    }
}

/// Fan-out/fan-in dispatcher over a bounded worker pool
pub struct Dispatcher {
    pool: ThreadPool,
    workers: usize,
    /// Batch shuffling RNG (None = particles keep id order)
    rng: Option<Pcg32>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.workers)
            .field("shuffle", &self.rng.is_some())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(workers: usize, shuffle_seed: Option<u64>) -> Result<Self, SimError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("physics-worker-{i}"))
            .build()?;
        log::info!("Physics pool ready with {workers} workers");

        Ok(Self {
            pool,
            workers,
            rng: shuffle_seed.map(Pcg32::seed_from_u64),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SimError> {
        let seed = settings.shuffle_batches.then_some(settings.shuffle_seed);
        Self::new(settings.resolved_workers(), seed)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Advance and resolve every particle once
    ///
    /// On return `particles` is back in id order. Every batch runs to
    /// completion (or to its first failure) before any error is returned.
    pub fn run(
        &mut self,
        particles: &mut [Particle],
        frame: &TickFrame<'_>,
    ) -> Result<BatchTotals, SimError> {
        if particles.is_empty() {
            return Ok(BatchTotals::default());
        }

        if let Some(rng) = self.rng.as_mut() {
            particles.shuffle(rng);
        }

        let batch_len = particles.len().div_ceil(self.workers);
        let batch_count = particles.len().div_ceil(batch_len);
        let mut outcomes: Vec<Option<Result<BatchTotals, SimError>>> =
            (0..batch_count).map(|_| None).collect();

        if batch_count == 1 {
            outcomes[0] = Some(run_batch(0, particles, frame));
        } else {
            self.pool.scope(|scope| {
                for (batch, (slice, slot)) in particles
                    .chunks_mut(batch_len)
                    .zip(outcomes.iter_mut())
                    .enumerate()
                {
                    scope.spawn(move |_| *slot = Some(run_batch(batch, slice, frame)));
                }
            });
        }

        particles.sort_unstable_by_key(|p| p.id);

        let mut totals = BatchTotals::default();
        let mut first_error = None;
        for (batch, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Some(Ok(batch_totals)) => totals.merge(batch_totals),
                Some(Err(err)) => {
                    log::error!("Tick {} batch {batch} failed: {err}", frame.tick);
                    first_error.get_or_insert(err);
                }
                None => {
                    first_error.get_or_insert(SimError::WorkerPanicked {
                        batch,
                        message: "batch never reported".into(),
                    });
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(totals),
        }
    }
}

/// Process one batch, turning a worker panic into an error
fn run_batch(
    batch: usize,
    particles: &mut [Particle],
    frame: &TickFrame<'_>,
) -> Result<BatchTotals, SimError> {
    panic::catch_unwind(AssertUnwindSafe(|| update_batch(particles, frame))).unwrap_or_else(
        |payload| {
            Err(SimError::WorkerPanicked {
                batch,
                message: panic_message(payload.as_ref()),
            })
        },
    )
}

fn update_batch(particles: &mut [Particle], frame: &TickFrame<'_>) -> Result<BatchTotals, SimError> {
    let mut totals = BatchTotals {
        batches: 1,
        ..Default::default()
    };
    for particle in particles.iter_mut() {
        particle.advance(frame.dt);
        let result = resolve(particle, frame.arena, frame.walls, frame.lookahead);
        totals.record(&result);
        check_invariants(particle, frame)?;
    }
    Ok(totals)
}

/// Post-update invariants every particle must satisfy
fn check_invariants(particle: &Particle, frame: &TickFrame<'_>) -> Result<(), SimError> {
    let fail = |reason: String| SimError::ParticleInvariant {
        id: particle.id,
        tick: frame.tick,
        reason,
    };

    let angle = particle.angle();
    if !(0.0..360.0).contains(&angle) {
        return Err(fail(format!("angle {angle} outside [0, 360)")));
    }
    if !particle.speed.is_finite() {
        return Err(fail(format!("speed {} is not finite", particle.speed)));
    }
    if !frame.arena.contains(particle.pos.x, particle.pos.y) {
        return Err(fail(format!("position {} outside the arena", particle.pos)));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
