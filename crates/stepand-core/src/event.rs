//! Events published by a walk session
//!
//! Events are the only output of the walk service: the presentation layer
//! subscribes and renders the arrow, distance label and completion prompt
//! from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::geo::{NavigationFix, UserLocation};
use crate::mission::{CompletionReason, MissionId};
use crate::summary::WalkSummary;

/// A walk event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkEvent {
    /// Unique event identifier
    pub id: Uuid,
    /// Walk session the event belongs to
    pub session_id: Uuid,
    /// Event payload
    pub payload: WalkEventPayload,
    /// When the event was created
    pub timestamp: DateTime<Utc>,
}

impl WalkEvent {
    /// Create a new event
    pub fn new(session_id: Uuid, payload: WalkEventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Category of the payload
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}

/// Event categories, for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Session start and end
    Lifecycle,
    /// Per-sample navigation output
    Navigation,
    /// Mission range changes and completions
    Mission,
    /// Walk clock ticks
    Clock,
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalkEventPayload {
    /// Initial fix acquired and missions generated
    Started {
        start: UserLocation,
        missions: usize,
        first_mission: Option<MissionId>,
    },
    /// Navigation output for the latest sample
    NavigationUpdated {
        mission_id: MissionId,
        fix: NavigationFix,
        travelled_m: f64,
    },
    /// User entered the current mission's radius
    MissionInRange {
        mission_id: MissionId,
        entry: u32,
    },
    /// User left the radius before completion
    MissionOutOfRange {
        mission_id: MissionId,
    },
    /// Mission completed; story advanced
    MissionCompleted {
        mission_id: MissionId,
        reason: CompletionReason,
        next: Option<MissionId>,
        story_progress: usize,
        chapter: String,
    },
    /// Walk clock tick
    Tick {
        elapsed: Duration,
    },
    /// The location stream ended or failed
    LocationLost {
        reason: String,
    },
    /// Walk finished; the session is over
    Finished {
        summary: WalkSummary,
    },
}

impl WalkEventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            WalkEventPayload::Started { .. }
            | WalkEventPayload::LocationLost { .. }
            | WalkEventPayload::Finished { .. } => EventType::Lifecycle,
            WalkEventPayload::NavigationUpdated { .. } => EventType::Navigation,
            WalkEventPayload::MissionInRange { .. }
            | WalkEventPayload::MissionOutOfRange { .. }
            | WalkEventPayload::MissionCompleted { .. } => EventType::Mission,
            WalkEventPayload::Tick { .. } => EventType::Clock,
        }
    }
}

/// Event subscription filter
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Filter by event types
    pub event_types: Option<Vec<EventType>>,
    /// Filter by session
    pub session_id: Option<Uuid>,
    /// Filter by time range (after)
    pub after: Option<DateTime<Utc>>,
}

impl EventFilter {
    /// Create a filter for specific event types
    pub fn for_types(types: Vec<EventType>) -> Self {
        Self {
            event_types: Some(types),
            ..Default::default()
        }
    }

    /// Create a filter for one session
    pub fn for_session(session_id: Uuid) -> Self {
        Self {
            session_id: Some(session_id),
            ..Default::default()
        }
    }

    /// Check if an event matches this filter
    pub fn matches(&self, event: &WalkEvent) -> bool {
        if let Some(ref types) = self.event_types {
            if !types.contains(&event.event_type()) {
                return false;
            }
        }

        if let Some(session_id) = self.session_id {
            if event.session_id != session_id {
                return false;
            }
        }

        if let Some(after) = self.after {
            if event.timestamp < after {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let session = Uuid::new_v4();
        let event = WalkEvent::new(
            session,
            WalkEventPayload::MissionInRange {
                mission_id: MissionId(2),
                entry: 1,
            },
        );

        assert_eq!(event.event_type(), EventType::Mission);
        assert_eq!(event.session_id, session);
    }

    #[test]
    fn test_event_filter() {
        let session = Uuid::new_v4();
        let tick = WalkEvent::new(session, WalkEventPayload::Tick { elapsed: Duration::from_secs(3) });
        let lost = WalkEvent::new(session, WalkEventPayload::LocationLost { reason: "gps off".into() });

        let filter = EventFilter::for_types(vec![EventType::Lifecycle, EventType::Mission]);
        assert!(!filter.matches(&tick));
        assert!(filter.matches(&lost));

        let other = EventFilter::for_session(Uuid::new_v4());
        assert!(!other.matches(&lost));
        assert!(EventFilter::default().matches(&tick));
    }

    #[test]
    fn test_event_serialization() {
        let event = WalkEvent::new(
            Uuid::new_v4(),
            WalkEventPayload::MissionOutOfRange { mission_id: MissionId(1) },
        );
        let json = serde_json::to_string(&event).unwrap();
        let recovered: WalkEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.id, event.id);
        assert_eq!(recovered.event_type(), EventType::Mission);
    }
}
