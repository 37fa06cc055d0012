//! Particle Arena headless runner
//!
//! Usage: `particle-arena [settings.json] [seconds]`
//!
//! Seeds one batch of each spawn pattern plus a few walls, runs the tick
//! driver for the requested time and prints the final snapshot as JSON.
//! Set `RUST_LOG=debug` for per-second tick summaries.

use std::error::Error;
use std::time::Duration;

use particle_arena::{Settings, Simulation};

const DEFAULT_RUN_SECS: f64 = 3.0;

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

/// Parse the run length argument; negative, infinite and NaN values are errors
fn run_duration(arg: Option<&str>) -> Result<Duration, Box<dyn Error>> {
    let seconds = match arg {
        Some(value) => value.parse::<f64>()?,
        None => DEFAULT_RUN_SECS,
    };
    Ok(Duration::try_from_secs_f64(seconds)?)
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let run_for = run_duration(args.next().as_deref())?;

    let sim = Simulation::new(settings)?;
    log::info!("Particle Arena starting ({run_for:?} headless run)");

    let arena = sim.settings().arena;
    let (w, h) = (arena.width, arena.height);

    // Evenly spaced line, shared heading
    sim.spawn_point(200, 40, 40, w - 40, 40, 60.0, 180.0);
    // Fan of headings from the centre
    sim.spawn_angle_sweep(360, w / 2, h / 2, 0.0, 359.0, 120.0);
    // Speed ramp along one heading
    sim.spawn_speed_sweep(100, 80, h / 2, 20.0, 30.0, 600.0);

    sim.add_wall(w / 4, h / 4, w / 4, 3 * h / 4);
    sim.add_wall(3 * w / 4, h / 4, 3 * w / 4, 3 * h / 4);
    sim.add_wall(w / 3, h - 60, 2 * w / 3, h - 120);

    sim.start()?;
    std::thread::sleep(run_for);
    let ticks = sim.stop()?;

    let snapshot = sim.snapshot();
    log::info!(
        "Ran {ticks} ticks: {} particles, {} walls",
        snapshot.particles.len(),
        snapshot.walls.len()
    );
    println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_duration() {
        assert_eq!(run_duration(None).expect("default"), Duration::from_secs(3));
        assert_eq!(run_duration(Some("0.5")).expect("half"), Duration::from_millis(500));
        assert!(run_duration(Some("inf")).is_err());
        assert!(run_duration(Some("-1")).is_err());
        assert!(run_duration(Some("NaN")).is_err());
        assert!(run_duration(Some("soon")).is_err());
    }
}
