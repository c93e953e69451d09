use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::Catalog;
use crate::error::FlowError;

/// Reading level offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }

    /// Parse user input where the empty string means "unset".
    pub fn parse_optional(value: &str) -> Result<Option<Level>, FlowError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FlowError::UnknownLevel(s.to_string()))
    }
}

/// The three facets the user picks before asking for recommendations.
///
/// Genre and mood are opaque catalog keys. Empty input is stored as unset so a
/// selection is complete exactly when all three fields are `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub level: Option<Level>,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    Some(value.into()).filter(|v| !v.is_empty())
}

impl Selection {
    /// Sets the genre and always clears the mood.
    pub fn set_genre(&mut self, genre: impl Into<String>) {
        self.genre = non_empty(genre);
        self.mood = None;
    }

    /// Sets the mood as given; callers only offer moods from [`Selection::available_moods`].
    pub fn set_mood(&mut self, mood: impl Into<String>) {
        self.mood = non_empty(mood);
    }

    pub fn set_level(&mut self, level: Option<Level>) {
        self.level = level;
    }

    pub fn available_moods<'a>(&self, catalog: &'a Catalog) -> &'a [String] {
        match &self.genre {
            Some(genre) => catalog.moods_for(genre),
            None => &[],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.genre.is_some() && self.mood.is_some() && self.level.is_some()
    }

    /// Borrow all three fields at once, or `None` while any is unset.
    pub fn complete(&self) -> Option<(&str, &str, Level)> {
        match (&self.genre, &self.mood, self.level) {
            (Some(genre), Some(mood), Some(level)) => Some((genre, mood, level)),
            _ => None,
        }
    }
}
