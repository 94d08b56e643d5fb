//! Per-walk progress over an ordered list of missions
//!
//! The tracker owns the missions of one walk and consumes location samples
//! one at a time. Only the current mission is navigated; completing it
//! advances to the next one. Nothing here is asynchronous: timers and the
//! location stream live in the walk service, which calls into the tracker.

use std::time::Duration;

use tracing::{debug, info, trace};

use crate::error::{Result, StepandError};
use crate::geo::{self, NavigationFix, UserLocation};
use crate::mission::{CompletionReason, Mission, MissionId, MissionState, RangeTransition};
use crate::story::{self, Genre};
use crate::summary::WalkSummary;

/// Outcome of feeding one sample to the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerUpdate {
    /// Mission being navigated, `None` once all are done
    pub mission_id: Option<MissionId>,
    /// Geometry to the current mission
    pub fix: Option<NavigationFix>,
    /// Range change of the current mission caused by this sample
    pub transition: Option<RangeTransition>,
    /// Total distance travelled so far
    pub travelled_m: f64,
}

/// A mission that was just completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub mission_id: MissionId,
    pub reason: CompletionReason,
    /// Next mission to navigate, `None` when the walk is finished
    pub next: Option<MissionId>,
    /// Range entry of the next mission if the user already stands inside it
    pub next_entered: Option<u32>,
}

/// Progress of a single walk
#[derive(Debug, Clone)]
pub struct WalkTracker {
    missions: Vec<Mission>,
    current: usize,
    last_sample: Option<UserLocation>,
    travelled_m: f64,
}

impl WalkTracker {
    /// Start tracking the given missions, visited in order
    pub fn new(missions: Vec<Mission>) -> Self {
        Self {
            missions,
            current: 0,
            last_sample: None,
            travelled_m: 0.0,
        }
    }

    /// Start with a known first position so the first sample adds no distance jump
    pub fn starting_at(missions: Vec<Mission>, start: UserLocation) -> Self {
        let mut tracker = Self::new(missions);
        tracker.last_sample = Some(start);
        tracker
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    pub fn mission(&self, id: MissionId) -> Option<&Mission> {
        self.missions.iter().find(|m| m.id() == id)
    }

    /// Mission currently being navigated
    pub fn current_mission(&self) -> Option<&Mission> {
        self.missions.get(self.current)
    }

    pub fn last_sample(&self) -> Option<&UserLocation> {
        self.last_sample.as_ref()
    }

    pub fn travelled_m(&self) -> f64 {
        self.travelled_m
    }

    /// Number of completed missions, also the story progress
    pub fn completed_count(&self) -> usize {
        self.missions.iter().filter(|m| m.is_completed()).count()
    }

    pub fn is_finished(&self) -> bool {
        !self.missions.is_empty() && self.current >= self.missions.len()
    }

    /// Narrative text for the current progress
    pub fn story_chapter(&self) -> &'static str {
        story::chapter(self.completed_count())
    }

    /// Consume the latest location sample
    pub fn observe(&mut self, sample: UserLocation) -> TrackerUpdate {
        if let Some(previous) = self.last_sample {
            self.travelled_m += geo::distance(&previous.coordinate, &sample.coordinate);
        }
        self.last_sample = Some(sample);

        let travelled_m = self.travelled_m;
        let Some(mission) = self.missions.get_mut(self.current) else {
            return TrackerUpdate {
                mission_id: None,
                fix: None,
                transition: None,
                travelled_m,
            };
        };

        let fix = NavigationFix::compute(&sample, mission);
        let transition = mission.observe(fix.distance_m);
        trace!(
            mission = %mission.id(),
            distance_m = fix.distance_m,
            bearing = ?fix.bearing_deg,
            "navigation fix"
        );
        match transition {
            Some(RangeTransition::Entered { entry }) => {
                debug!(mission = %mission.id(), entry, "entered mission radius");
            }
            Some(RangeTransition::Left) => {
                debug!(mission = %mission.id(), "left mission radius");
            }
            None => {}
        }

        TrackerUpdate {
            mission_id: Some(mission.id()),
            fix: Some(fix),
            transition,
            travelled_m,
        }
    }

    /// Explicit user confirmation of the current mission
    pub fn confirm_current(&mut self) -> Result<Completion> {
        let mission = self
            .missions
            .get_mut(self.current)
            .ok_or(StepandError::NoActiveMission)?;
        mission.complete(CompletionReason::UserConfirmed)?;
        Ok(self.advance(CompletionReason::UserConfirmed))
    }

    /// Dwell timer expiry for `mission_id`, armed at range entry `entry`
    ///
    /// Returns `Ok(None)` when the timer is stale: the user left the radius,
    /// re-entered since, or the mission is no longer current.
    pub fn complete_after_dwell(&mut self, mission_id: MissionId, entry: u32) -> Result<Option<Completion>> {
        let index = self
            .missions
            .iter()
            .position(|m| m.id() == mission_id)
            .ok_or(StepandError::MissionNotFound(mission_id))?;

        if index != self.current {
            return Ok(None);
        }
        if !self.missions[index].complete_after_dwell(entry)? {
            return Ok(None);
        }
        Ok(Some(self.advance(CompletionReason::DwellElapsed)))
    }

    fn advance(&mut self, reason: CompletionReason) -> Completion {
        let mission_id = self.missions[self.current].id();
        self.current += 1;
        let next = self.current_mission().map(Mission::id);

        info!(
            mission = %mission_id,
            ?reason,
            progress = self.completed_count(),
            total = self.missions.len(),
            "mission completed"
        );

        // Re-evaluate the new target against where the user already stands
        let mut next_entered = None;
        if let (Some(sample), Some(mission)) = (self.last_sample, self.missions.get_mut(self.current)) {
            let fix = NavigationFix::compute(&sample, mission);
            if let Some(RangeTransition::Entered { entry }) = mission.observe(fix.distance_m) {
                next_entered = Some(entry);
            }
        }

        Completion {
            mission_id,
            reason,
            next,
            next_entered,
        }
    }

    /// State of the current mission, `None` once finished
    pub fn current_state(&self) -> Option<MissionState> {
        self.current_mission().map(Mission::state)
    }

    /// Result of the walk so far
    pub fn summary(&self, genre: Genre, elapsed: Duration) -> WalkSummary {
        WalkSummary::new(
            genre,
            elapsed,
            self.travelled_m,
            self.completed_count(),
            self.missions.len(),
        )
    }
}
