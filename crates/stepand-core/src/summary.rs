//! End-of-walk results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::format::{format_clock, format_distance};
use crate::story::Genre;

/// Grade derived from mission completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
    D,
}

impl Rank {
    /// Rank for a completion percentage
    pub fn from_completion(percent: f64) -> Self {
        if percent >= 95.0 {
            Rank::S
        } else if percent >= 85.0 {
            Rank::A
        } else if percent >= 75.0 {
            Rank::B
        } else if percent >= 65.0 {
            Rank::C
        } else {
            Rank::D
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
        };
        f.write_str(s)
    }
}

/// Result of a finished walk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkSummary {
    pub genre: Genre,
    /// Wall time from start to finish
    pub elapsed: Duration,
    /// Distance travelled between location samples
    pub distance_m: f64,
    pub missions_completed: usize,
    pub missions_total: usize,
    pub completion_percent: f64,
    pub rank: Rank,
}

impl WalkSummary {
    pub fn new(
        genre: Genre,
        elapsed: Duration,
        distance_m: f64,
        missions_completed: usize,
        missions_total: usize,
    ) -> Self {
        let completion_percent = if missions_total == 0 {
            0.0
        } else {
            missions_completed as f64 * 100.0 / missions_total as f64
        };

        Self {
            genre,
            elapsed,
            distance_m,
            missions_completed,
            missions_total,
            completion_percent,
            rank: Rank::from_completion(completion_percent),
        }
    }

    /// Whether every mission was completed
    pub fn is_complete(&self) -> bool {
        self.missions_total > 0 && self.missions_completed == self.missions_total
    }

    /// Distance in kilometres, two decimals
    pub fn distance_km(&self) -> f64 {
        (self.distance_m / 10.0).round() / 100.0
    }

    /// Message for sharing the result
    pub fn share_message(&self) -> String {
        format!(
            "Finished a {} walk with Step&!\nDistance: {}\nTime: {}\nCompletion: {:.0}%\nRank: {}\n\n#StepAnd #ARWalk #{}",
            self.genre,
            format_distance(self.distance_m),
            format_clock(self.elapsed),
            self.completion_percent,
            self.rank,
            self.genre.id()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(Rank::from_completion(100.0), Rank::S);
        assert_eq!(Rank::from_completion(95.0), Rank::S);
        assert_eq!(Rank::from_completion(94.9), Rank::A);
        assert_eq!(Rank::from_completion(85.0), Rank::A);
        assert_eq!(Rank::from_completion(75.0), Rank::B);
        assert_eq!(Rank::from_completion(65.0), Rank::C);
        assert_eq!(Rank::from_completion(50.0), Rank::D);
    }

    #[test]
    fn test_summary_completion() {
        let full = WalkSummary::new(Genre::Fantasy, Duration::from_secs(600), 1234.0, 4, 4);
        assert_eq!(full.completion_percent, 100.0);
        assert_eq!(full.rank, Rank::S);
        assert!(full.is_complete());
        assert_eq!(full.distance_km(), 1.23);

        let partial = WalkSummary::new(Genre::Fantasy, Duration::from_secs(600), 10.0, 3, 4);
        assert_eq!(partial.completion_percent, 75.0);
        assert_eq!(partial.rank, Rank::B);
        assert!(!partial.is_complete());
    }

    #[test]
    fn test_summary_without_missions() {
        let empty = WalkSummary::new(Genre::Mystery, Duration::ZERO, 0.0, 0, 0);
        assert_eq!(empty.completion_percent, 0.0);
        assert_eq!(empty.rank, Rank::D);
        assert!(!empty.is_complete());
    }

    #[test]
    fn test_share_message() {
        let summary = WalkSummary::new(Genre::Horror, Duration::from_secs(125), 850.0, 4, 4);
        let msg = summary.share_message();
        assert!(msg.contains("Horror walk"));
        assert!(msg.contains("Distance: 850m"));
        assert!(msg.contains("Time: 02:05"));
        assert!(msg.contains("Rank: S"));
        assert!(msg.ends_with("#horror"));
    }
}
