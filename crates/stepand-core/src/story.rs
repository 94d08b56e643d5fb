//! Story selection and narrative progress

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::StepandError;

/// Story genre chosen before a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    #[default]
    Mystery,
    Fantasy,
    SciFi,
    Romance,
    Adventure,
    Horror,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Mystery,
        Genre::Fantasy,
        Genre::SciFi,
        Genre::Romance,
        Genre::Adventure,
        Genre::Horror,
    ];

    /// Identifier used in configuration and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Genre::Mystery => "mystery",
            Genre::Fantasy => "fantasy",
            Genre::SciFi => "scifi",
            Genre::Romance => "romance",
            Genre::Adventure => "adventure",
            Genre::Horror => "horror",
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Genre::Mystery => "Mystery",
            Genre::Fantasy => "Fantasy",
            Genre::SciFi => "Sci-Fi",
            Genre::Romance => "Romance",
            Genre::Adventure => "Adventure",
            Genre::Horror => "Horror",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Genre {
    type Err = StepandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Genre::ALL
            .into_iter()
            .find(|g| g.id() == wanted || g.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| StepandError::InvalidConfig(format!("unknown genre: {s}")))
    }
}

/// Story difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// A story the user walks through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub genre: Genre,
    pub planned_duration: Duration,
    pub difficulty: Difficulty,
}

impl Story {
    pub fn new(title: impl Into<String>, genre: Genre, planned_duration: Duration) -> Self {
        Self {
            title: title.into(),
            genre,
            planned_duration,
            difficulty: Difficulty::default(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }
}

/// Narrative shown as missions are completed, one chapter per progress step
pub const STORY_CHAPTERS: [&str; 4] = [
    "You arrive in a town full of secrets. With an old map in hand, the hunt for a lost treasure begins...",
    "The wind whispers: \"The truth lies in a hidden place.\" Look for the next clue.",
    "A strange light suddenly appears before you. It seems to point the right way.",
    "The story reaches its climax. Time to solve the final riddle.",
];

/// Chapter text for the given number of completed missions
///
/// Progress counts every completion, so it reaches the chapter count after
/// the last mission; the final chapter is kept from then on.
pub fn chapter(progress: usize) -> &'static str {
    STORY_CHAPTERS[progress.min(STORY_CHAPTERS.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_parse() {
        assert_eq!("mystery".parse::<Genre>().unwrap(), Genre::Mystery);
        assert_eq!("Sci-Fi".parse::<Genre>().unwrap(), Genre::SciFi);
        assert_eq!(" HORROR ".parse::<Genre>().unwrap(), Genre::Horror);
        assert!("western".parse::<Genre>().is_err());
    }

    #[test]
    fn test_genre_serde_uses_id() {
        let json = serde_json::to_string(&Genre::SciFi).unwrap();
        assert_eq!(json, "\"scifi\"");
        for genre in Genre::ALL {
            assert_eq!(genre.id().parse::<Genre>().unwrap(), genre);
        }
    }

    #[test]
    fn test_chapter_clamps() {
        assert_eq!(chapter(0), STORY_CHAPTERS[0]);
        assert_eq!(chapter(3), STORY_CHAPTERS[3]);
        assert_eq!(chapter(STORY_CHAPTERS.len()), STORY_CHAPTERS[3]);
        assert_eq!(chapter(10), STORY_CHAPTERS[3]);
    }
}
