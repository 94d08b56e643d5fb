//! Simulated walker
//!
//! Plans a route from the start location through every generated mission at
//! walking pace, lingering at each target long enough for the dwell timer,
//! and adds seeded GPS noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use stepand_core::mission::generate_missions;
use stepand_core::{geo, Coordinate, Result, SimulationConfig, UserLocation, WalkConfig};

/// Meters per degree of latitude
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Extra samples spent at each target beyond the dwell delay
const LINGER_MARGIN: usize = 2;

/// A planned walk
#[derive(Debug, Clone)]
pub struct Route {
    pub start: UserLocation,
    pub samples: Vec<UserLocation>,
}

/// Plan a route visiting all missions around `sim.start`
///
/// Noise is applied to every sample except the start fix. Jitter larger than
/// a mission radius can keep the walker from ever registering as in range.
pub fn plan_route(sim: &SimulationConfig, dwell: Duration) -> Result<Route> {
    let interval = sim.sample_interval.as_secs_f64();
    let step_m = sim.speed_mps * interval;
    let linger = (dwell.as_secs_f64() / interval).ceil() as usize + LINGER_MARGIN;

    let mut rng = StdRng::seed_from_u64(sim.seed);
    let mut samples = Vec::new();
    let mut from = sim.start;
    let mut heading = None;

    for mission in generate_missions(&sim.start)? {
        let target = mission.location();
        let legs = (geo::distance(&from, &target) / step_m).ceil().max(1.0) as usize;
        if let Some(bearing) = geo::bearing(&from, &target) {
            heading = Some(geo::wrap_360(bearing));
        }

        for i in 1..=legs {
            let t = i as f64 / legs as f64;
            let point = Coordinate::new(
                from.latitude() + (target.latitude() - from.latitude()) * t,
                from.longitude() + (target.longitude() - from.longitude()) * t,
            )?;
            samples.push(sample(jitter(point, sim.jitter_m, &mut rng)?, heading)?);
        }
        for _ in 0..linger {
            samples.push(sample(jitter(target, sim.jitter_m, &mut rng)?, heading)?);
        }
        from = target;
    }

    Ok(Route {
        start: UserLocation::new(sim.start),
        samples,
    })
}

/// Compress walk timers by `speedup` so a simulated walk finishes sooner
pub fn scale_walk(walk: &WalkConfig, speedup: f64) -> WalkConfig {
    WalkConfig {
        dwell_delay: scale(walk.dwell_delay, speedup),
        clock_interval: scale(walk.clock_interval, speedup),
        ..walk.clone()
    }
}

/// Divide a duration by `speedup`, never below one millisecond
pub fn scale(duration: Duration, speedup: f64) -> Duration {
    if !speedup.is_finite() || speedup <= 1.0 {
        return duration;
    }
    duration.div_f64(speedup).max(Duration::from_millis(1))
}

fn sample(point: Coordinate, heading: Option<f64>) -> Result<UserLocation> {
    let location = UserLocation::new(point);
    match heading {
        Some(h) => location.with_heading(h),
        None => Ok(location),
    }
}

fn jitter(point: Coordinate, jitter_m: f64, rng: &mut StdRng) -> Result<Coordinate> {
    if jitter_m <= 0.0 {
        return Ok(point);
    }
    let north_m = rng.gen_range(-jitter_m..=jitter_m);
    let east_m = rng.gen_range(-jitter_m..=jitter_m);
    let lon_scale = point.latitude().to_radians().cos().max(1e-6);
    point.offset(
        north_m / METERS_PER_DEGREE,
        east_m / (METERS_PER_DEGREE * lon_scale),
    )
}
