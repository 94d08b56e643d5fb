//! Session context shared by the screens of one app run
//!
//! Replaces app-wide mutable state with an explicit object passed by
//! reference. Each field has a single mutation path:
//!
//! - profile name: [`SessionContext::rename_user`]
//! - current story: [`SessionContext::select_story`] / [`SessionContext::clear_story`]
//! - totals, history and profile counters: [`SessionContext::record_walk`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::story::Story;
use crate::summary::WalkSummary;

/// Missions needed per profile level
pub const MISSIONS_PER_LEVEL: u32 = 5;

/// User profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub level: u32,
    pub total_distance_m: f64,
    pub total_missions: u32,
    pub badges: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Walker".to_string(),
            level: 1,
            total_distance_m: 0.0,
            total_missions: 0,
            badges: Vec::new(),
        }
    }
}

impl UserProfile {
    fn level_for(total_missions: u32) -> u32 {
        1 + total_missions / MISSIONS_PER_LEVEL
    }
}

/// Accumulated statistics for this session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkingTotals {
    pub walks: u32,
    pub distance_m: f64,
    pub missions: u32,
    pub time: Duration,
}

/// A finished walk kept in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkRecord {
    pub id: Uuid,
    pub story: Option<String>,
    pub summary: WalkSummary,
    pub finished_at: DateTime<Utc>,
}

/// What changed after recording a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub record_id: Uuid,
    pub leveled_up: bool,
    pub new_level: u32,
}

/// Explicit owner of profile, current story and walking totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    profile: UserProfile,
    current_story: Option<Story>,
    totals: WalkingTotals,
    history: Vec<WalkRecord>,
}

impl SessionContext {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            ..Default::default()
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn current_story(&self) -> Option<&Story> {
        self.current_story.as_ref()
    }

    pub fn totals(&self) -> &WalkingTotals {
        &self.totals
    }

    /// Finished walks, oldest first
    pub fn history(&self) -> &[WalkRecord] {
        &self.history
    }

    pub fn rename_user(&mut self, name: impl Into<String>) {
        self.profile.name = name.into();
    }

    pub fn select_story(&mut self, story: Story) {
        self.current_story = Some(story);
    }

    pub fn clear_story(&mut self) -> Option<Story> {
        self.current_story.take()
    }

    /// Fold a finished walk into totals, profile and history
    pub fn record_walk(&mut self, summary: WalkSummary) -> RecordOutcome {
        let missions = summary.missions_completed as u32;

        self.totals.walks += 1;
        self.totals.distance_m += summary.distance_m;
        self.totals.missions += missions;
        self.totals.time += summary.elapsed;

        let old_level = self.profile.level;
        self.profile.total_distance_m += summary.distance_m;
        self.profile.total_missions += missions;
        self.profile.level = old_level.max(UserProfile::level_for(self.profile.total_missions));

        if summary.is_complete() {
            let badge = format!("{} explorer", summary.genre);
            if !self.profile.badges.contains(&badge) {
                self.profile.badges.push(badge);
            }
        }

        let record = WalkRecord {
            id: Uuid::new_v4(),
            story: self.current_story.as_ref().map(|s| s.title.clone()),
            summary,
            finished_at: Utc::now(),
        };
        let record_id = record.id;
        self.history.push(record);

        RecordOutcome {
            record_id,
            leveled_up: self.profile.level > old_level,
            new_level: self.profile.level,
        }
    }
}
