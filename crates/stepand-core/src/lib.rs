//! Step& Core - Navigation geometry and walk progress for story walks
//!
//! This crate provides the synchronous building blocks of a story walk:
//! where the user is relative to a mission target, when a mission counts as
//! reached, and how a walk is summarized.
//!
//! # Modules
//!
//! - [`geo`] - Haversine distance, initial bearing, proximity
//! - [`mission`] - Missions, their state machine and generation
//! - [`tracker`] - Per-walk progress over the mission list
//! - [`story`] - Genres, stories and narrative chapters
//! - [`summary`] - Walk results and ranks
//! - [`format`] - Distance and time labels
//! - [`session`] - Explicit session context (profile, story, totals)
//! - [`event`] - Events published by a walk session
//! - [`config`] - Configuration types
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust
//! use stepand_core::geo::{self, Coordinate};
//!
//! let station = Coordinate::new(35.0, 139.0)?;
//! let north = Coordinate::new(35.0009, 139.0)?;
//!
//! let meters = geo::distance(&station, &north);
//! assert!((meters - 100.0).abs() < 2.0);
//! assert!(geo::bearing(&station, &north).is_some());
//! # Ok::<(), stepand_core::StepandError>(())
//! ```

// Geometry and missions
pub mod geo;
pub mod mission;
pub mod tracker;

// Story and results
pub mod story;
pub mod summary;
pub mod format;
pub mod session;

// Infrastructure modules
pub mod event;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{Result, StepandError};

pub use geo::{Coordinate, NavigationFix, UserLocation};
pub use mission::{CompletionReason, Mission, MissionId, MissionKind, MissionState, RangeTransition};
pub use tracker::{Completion, TrackerUpdate, WalkTracker};
pub use story::{Difficulty, Genre, Story};
pub use summary::{Rank, WalkSummary};
pub use session::{SessionContext, UserProfile, WalkingTotals};
pub use event::{EventFilter, EventType, WalkEvent, WalkEventPayload};
pub use config::{LoggingConfig, SimulationConfig, StepandConfig, WalkConfig};

use async_trait::async_trait;

/// Source of location samples
///
/// Production code wraps the device's GPS; tests supply fixtures. Gating on
/// permission and availability is the provider's job: when no fix can be
/// delivered it returns [`StepandError::LocationUnavailable`] instead of a
/// made-up position.
#[async_trait]
pub trait LocationProvider: Send {
    /// One-off fix used to start the walk
    async fn current(&mut self) -> Result<UserLocation>;

    /// Wait for the next sample; `None` when the stream has ended
    async fn next_sample(&mut self) -> Result<Option<UserLocation>>;

    /// Release the underlying subscription
    async fn stop(&mut self) -> Result<()>;

    /// Provider name (for logging)
    fn name(&self) -> &str;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
