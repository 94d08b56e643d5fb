//! Step& Walk - async walk sessions
//!
//! This crate runs a story walk on top of `stepand-core`: it pulls location
//! samples from a [`LocationProvider`](stepand_core::LocationProvider),
//! drives the mission tracker, schedules dwell timers and publishes
//! [`WalkEvent`](stepand_core::WalkEvent)s for the presentation layer.
//!
//! # Overview
//!
//! - **Service**: one task owns the walk; everything else talks to it
//!   through a [`WalkHandle`] or listens on the event channel
//! - **Scheduler**: cancellable dwell timers and the walk clock
//! - **Providers**: scripted routes for simulation and tests, and a
//!   channel-fed provider for a real GPS adapter
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use stepand_core::{UserLocation, WalkConfig};
//! use stepand_walk::{ScriptedLocationProvider, WalkService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let start = UserLocation::from_degrees(35.6812, 139.7671, None)?;
//!     let provider = ScriptedLocationProvider::new(start, vec![start; 30], Duration::from_secs(1));
//!
//!     let (service, handle, mut events) = WalkService::new(WalkConfig::default(), provider)?;
//!     let walk = tokio::spawn(service.run());
//!
//!     // Listen for events
//!     while let Ok(event) = events.recv().await {
//!         println!("Event: {:?}", event.payload);
//!         if matches!(event.payload, stepand_core::WalkEventPayload::Finished { .. }) {
//!             break;
//!         }
//!     }
//!
//!     handle.stop().await.ok();
//!     let summary = walk.await??;
//!     println!("{}", summary.share_message());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod provider;
pub mod scheduler;
pub mod service;

pub use error::{Result, WalkError};
pub use provider::{ChannelLocationProvider, LocationSender, ScriptedLocationProvider};
pub use scheduler::{ScheduledTask, TaskId, TaskScheduler};
pub use service::{WalkCommand, WalkHandle, WalkService, WalkSnapshot};
