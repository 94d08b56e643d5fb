//! Walk missions and their state machine
//!
//! A mission is a target location the user has to physically approach.
//! Missions are generated once per walk from the start location and move
//! through `Pending -> InRange -> Completed`; `Completed` is terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StepandError};
use crate::geo::{self, Coordinate};

/// Mission identifier, unique within a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MissionId(pub u32);

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of place the target is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionKind {
    Landmark,
    Sign,
    Nature,
    Path,
}

/// Progress of a single mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionState {
    /// User is outside the radius
    Pending,
    /// User is inside the radius, waiting for confirmation
    InRange,
    /// Mission is done
    Completed,
}

/// How a mission got completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionReason {
    /// User stayed in range for the dwell delay
    DwellElapsed,
    /// User pressed the confirm action
    UserConfirmed,
}

/// State change caused by a proximity observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeTransition {
    /// Crossed into the radius; `entry` counts range entries for this mission
    Entered { entry: u32 },
    /// Left the radius before completion
    Left,
}

/// A target the user must reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMission")]
pub struct Mission {
    id: MissionId,
    kind: MissionKind,
    target: String,
    description: String,
    location: Coordinate,
    radius_m: f64,
    state: MissionState,
    range_entries: u32,
    completed_by: Option<CompletionReason>,
}

#[derive(Deserialize)]
struct RawMission {
    id: MissionId,
    kind: MissionKind,
    target: String,
    description: String,
    location: Coordinate,
    radius_m: f64,
    state: MissionState,
    range_entries: u32,
    completed_by: Option<CompletionReason>,
}

impl TryFrom<RawMission> for Mission {
    type Error = StepandError;

    fn try_from(raw: RawMission) -> Result<Self> {
        let mut mission = Mission::new(
            raw.id,
            raw.kind,
            raw.target,
            raw.description,
            raw.location,
            raw.radius_m,
        )?;

        // Completion reason is present exactly when completed, and a mission
        // that is or was in range has been entered at least once.
        let consistent = match (raw.state, raw.completed_by) {
            (MissionState::Completed, Some(_)) => raw.range_entries > 0,
            (MissionState::InRange, None) => raw.range_entries > 0,
            (MissionState::Pending, None) => true,
            _ => false,
        };
        if !consistent {
            return Err(StepandError::InvalidMissionState {
                id: raw.id,
                state: raw.state,
            });
        }

        mission.state = raw.state;
        mission.range_entries = raw.range_entries;
        mission.completed_by = raw.completed_by;
        Ok(mission)
    }
}

impl Mission {
    /// Create a pending mission; the radius must be positive
    pub fn new(
        id: MissionId,
        kind: MissionKind,
        target: impl Into<String>,
        description: impl Into<String>,
        location: Coordinate,
        radius_m: f64,
    ) -> Result<Self> {
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(StepandError::InvalidRadius(radius_m));
        }

        Ok(Self {
            id,
            kind,
            target: target.into(),
            description: description.into(),
            location,
            radius_m,
            state: MissionState::Pending,
            range_entries: 0,
            completed_by: None,
        })
    }

    pub fn id(&self) -> MissionId {
        self.id
    }

    pub fn kind(&self) -> MissionKind {
        self.kind
    }

    /// Short label of the target
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> Coordinate {
        self.location
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == MissionState::Completed
    }

    /// How many times the user has entered the radius
    pub fn range_entries(&self) -> u32 {
        self.range_entries
    }

    pub fn completed_by(&self) -> Option<CompletionReason> {
        self.completed_by
    }

    /// Feed the latest distance to the target
    ///
    /// Sitting exactly on the radius boundary may flap between states on
    /// successive samples. Completed missions ignore observations.
    pub fn observe(&mut self, distance_m: f64) -> Option<RangeTransition> {
        let near = geo::is_near(distance_m, self.radius_m);

        match (self.state, near) {
            (MissionState::Pending, true) => {
                self.state = MissionState::InRange;
                self.range_entries += 1;
                Some(RangeTransition::Entered {
                    entry: self.range_entries,
                })
            }
            (MissionState::InRange, false) => {
                self.state = MissionState::Pending;
                Some(RangeTransition::Left)
            }
            _ => None,
        }
    }

    /// Complete the mission; only valid while in range
    pub fn complete(&mut self, reason: CompletionReason) -> Result<()> {
        match self.state {
            MissionState::InRange => {
                self.state = MissionState::Completed;
                self.completed_by = Some(reason);
                Ok(())
            }
            MissionState::Completed => Err(StepandError::MissionAlreadyCompleted(self.id)),
            state => Err(StepandError::MissionNotInRange { id: self.id, state }),
        }
    }

    /// Complete on dwell expiry, but only for the range entry the timer was armed for
    pub fn complete_after_dwell(&mut self, entry: u32) -> Result<bool> {
        if self.state != MissionState::InRange || self.range_entries != entry {
            return Ok(false);
        }
        self.complete(CompletionReason::DwellElapsed)?;
        Ok(true)
    }
}

/// Blueprint for a mission placed relative to the start location
struct MissionTemplate {
    kind: MissionKind,
    target: &'static str,
    description: &'static str,
    delta_lat: f64,
    delta_lon: f64,
    radius_m: f64,
}

const MISSION_TEMPLATES: [MissionTemplate; 4] = [
    MissionTemplate {
        kind: MissionKind::Landmark,
        target: "Red-roofed building",
        description: "Find the mysterious red-roofed building and take a photo",
        delta_lat: 0.001,
        delta_lon: 0.001,
        radius_m: 20.0,
    },
    MissionTemplate {
        kind: MissionKind::Sign,
        target: "Blue signboard",
        description: "Discover the blue signboard that hides a clue to the story",
        delta_lat: 0.002,
        delta_lon: -0.001,
        radius_m: 25.0,
    },
    MissionTemplate {
        kind: MissionKind::Nature,
        target: "Old tree",
        description: "Approach the old tree said to hold a spell",
        delta_lat: -0.001,
        delta_lon: 0.002,
        radius_m: 15.0,
    },
    MissionTemplate {
        kind: MissionKind::Path,
        target: "Cobblestone path",
        description: "Follow the cobblestone path walked by adventurers before you",
        delta_lat: 0.0015,
        delta_lon: -0.0015,
        radius_m: 30.0,
    },
];

/// Generate the walk's missions around the start location, in visiting order
pub fn generate_missions(start: &Coordinate) -> Result<Vec<Mission>> {
    MISSION_TEMPLATES
        .iter()
        .zip(1..)
        .map(|(template, id)| {
            Mission::new(
                MissionId(id),
                template.kind,
                template.target,
                template.description,
                start.offset(template.delta_lat, template.delta_lon)?,
                template.radius_m,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mission(radius_m: f64) -> Mission {
        Mission::new(
            MissionId(1),
            MissionKind::Landmark,
            "Tower",
            "Reach the tower",
            Coordinate::new(35.0, 139.0).unwrap(),
            radius_m,
        )
        .unwrap()
    }

    #[test]
    fn test_radius_must_be_positive() {
        let at = Coordinate::new(35.0, 139.0).unwrap();
        for radius in [0.0, -5.0, f64::NAN] {
            let err = Mission::new(MissionId(1), MissionKind::Sign, "a", "b", at, radius);
            assert!(matches!(err, Err(StepandError::InvalidRadius(_))));
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let mut m = mission(20.0);
        m.observe(1.0);
        m.complete(CompletionReason::DwellElapsed).unwrap();
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(serde_json::from_value::<Mission>(json.clone()).unwrap(), m);

        let mut negative = json.clone();
        negative["radius_m"] = serde_json::json!(-5.0);
        assert!(serde_json::from_value::<Mission>(negative).is_err());

        let mut no_reason = json.clone();
        no_reason["completed_by"] = serde_json::Value::Null;
        assert!(serde_json::from_value::<Mission>(no_reason).is_err());

        let mut never_entered = json;
        never_entered["state"] = serde_json::json!("InRange");
        never_entered["completed_by"] = serde_json::Value::Null;
        never_entered["range_entries"] = serde_json::json!(0);
        assert!(serde_json::from_value::<Mission>(never_entered).is_err());
    }

    #[test]
    fn test_enter_and_leave_range() {
        let mut m = mission(20.0);
        assert_eq!(m.observe(50.0), None);
        assert_eq!(m.observe(20.0), Some(RangeTransition::Entered { entry: 1 }));
        assert_eq!(m.state(), MissionState::InRange);
        assert_eq!(m.observe(10.0), None);
        assert_eq!(m.observe(20.5), Some(RangeTransition::Left));
        assert_eq!(m.state(), MissionState::Pending);
        assert_eq!(m.observe(5.0), Some(RangeTransition::Entered { entry: 2 }));
    }

    #[test]
    fn test_boundary_flaps_without_hysteresis() {
        let mut m = mission(20.0);
        let transitions: Vec<_> = [20.0, 20.01, 20.0, 20.01]
            .iter()
            .filter_map(|d| m.observe(*d))
            .collect();
        assert_eq!(transitions.len(), 4);
    }

    #[test]
    fn test_cannot_complete_from_pending() {
        let mut m = mission(20.0);
        let err = m.complete(CompletionReason::UserConfirmed).unwrap_err();
        assert!(matches!(err, StepandError::MissionNotInRange { state: MissionState::Pending, .. }));
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut m = mission(20.0);
        m.observe(1.0);
        m.complete(CompletionReason::UserConfirmed).unwrap();
        assert!(m.is_completed());

        assert_eq!(m.observe(500.0), None);
        assert_eq!(m.state(), MissionState::Completed);
        assert_eq!(
            m.complete(CompletionReason::DwellElapsed),
            Err(StepandError::MissionAlreadyCompleted(MissionId(1)))
        );
        assert_eq!(m.completed_by(), Some(CompletionReason::UserConfirmed));
    }

    #[test]
    fn test_stale_dwell_does_not_complete() {
        let mut m = mission(20.0);
        m.observe(1.0); // entry 1
        m.observe(99.0);
        m.observe(1.0); // entry 2

        assert!(!m.complete_after_dwell(1).unwrap());
        assert_eq!(m.state(), MissionState::InRange);
        assert!(m.complete_after_dwell(2).unwrap());
        assert_eq!(m.completed_by(), Some(CompletionReason::DwellElapsed));
    }

    #[test]
    fn test_dwell_after_leaving_does_not_complete() {
        let mut m = mission(20.0);
        m.observe(1.0);
        m.observe(99.0);
        assert!(!m.complete_after_dwell(1).unwrap());
        assert_eq!(m.state(), MissionState::Pending);
    }

    #[test]
    fn test_generate_missions() {
        let start = Coordinate::new(35.6812, 139.7671).unwrap();
        let missions = generate_missions(&start).unwrap();

        assert_eq!(missions.len(), 4);
        assert_eq!(missions[0].id(), MissionId(1));
        assert_eq!(missions[3].id(), MissionId(4));
        assert!(missions.iter().all(|m| m.state() == MissionState::Pending));
        assert!(missions.iter().all(|m| m.radius_m() > 0.0));

        let first = missions[0].location();
        assert!((first.latitude() - 35.6822).abs() < 1e-9);
        assert!((first.longitude() - 139.7681).abs() < 1e-9);
        assert_eq!(missions[2].radius_m(), 15.0);
    }

    #[test]
    fn test_generate_missions_near_pole_fails() {
        let start = Coordinate::new(89.9995, 0.0).unwrap();
        assert!(generate_missions(&start).is_err());
    }
}
