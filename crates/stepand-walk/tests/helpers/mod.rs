//! Walker - drives a channel-fed location provider along a route
//!
//! Integration tests push samples the way a GPS adapter would: one per
//! interval, from a separate task, until the route runs out or the walk
//! service closes the channel.

use std::time::Duration;
use tokio::task::JoinHandle;

use stepand_core::mission::generate_missions;
use stepand_core::{Coordinate, Mission, UserLocation};
use stepand_walk::{ChannelLocationProvider, LocationSender};

pub const START: (f64, f64) = (35.6812, 139.7671);

pub fn start() -> Coordinate {
    Coordinate::new(START.0, START.1).expect("valid start")
}

/// Mission targets generated for [`start`], in visiting order
pub fn targets() -> Vec<Coordinate> {
    generate_missions(&start())
        .expect("missions")
        .iter()
        .map(Mission::location)
        .collect()
}

/// Straight-line samples from `from` to `to`, excluding `from`
pub fn leg(from: Coordinate, to: Coordinate, steps: usize) -> Vec<UserLocation> {
    (1..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let lat = from.latitude() + (to.latitude() - from.latitude()) * t;
            let lon = from.longitude() + (to.longitude() - from.longitude()) * t;
            UserLocation::new(Coordinate::new(lat, lon).expect("interpolated coordinate"))
        })
        .collect()
}

/// Route through all missions, lingering `linger` samples at each
pub fn full_route(linger: usize) -> Vec<UserLocation> {
    let mut route = Vec::new();
    let mut from = start();
    for target in targets() {
        route.extend(leg(from, target, 8));
        route.extend(std::iter::repeat(UserLocation::new(target)).take(linger));
        from = target;
    }
    route
}

/// Background task feeding a [`ChannelLocationProvider`]
pub struct Walker {
    pub task: JoinHandle<usize>,
}

impl Walker {
    /// Send the start fix immediately, then one route sample per `interval`
    ///
    /// The task ends when the route is exhausted or the provider stops
    /// listening, returning how many route samples were delivered.
    pub fn spawn(route: Vec<UserLocation>, interval: Duration) -> (Self, ChannelLocationProvider) {
        let (tx, provider) = ChannelLocationProvider::channel(4);
        let task = tokio::spawn(walk(tx, route, interval));
        (Self { task }, provider)
    }
}

async fn walk(tx: LocationSender, route: Vec<UserLocation>, interval: Duration) -> usize {
    if tx.send(UserLocation::new(start())).await.is_err() {
        return 0;
    }

    let mut delivered = 0;
    for sample in route {
        tokio::time::sleep(interval).await;
        if tx.send(sample).await.is_err() {
            break;
        }
        delivered += 1;
    }
    delivered
}
