//! Music Preferences
//!
//! The genre the listener picks before generation. The backend keys its
//! prompt off this value together with the latest HRV reading.

use serde::{Deserialize, Serialize};

/// A supported music preference
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicPreference {
    /// Pop
    Pop,
    /// Rock
    Rock,
    /// Classical
    Classical,
}

impl MusicPreference {
    /// All supported preferences
    pub const ALL: [MusicPreference; 3] = [Self::Pop, Self::Rock, Self::Classical];

    /// Parse a preference, accepting the backend's localized aliases
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pop" | "流行" => Some(Self::Pop),
            "rock" | "摇滚" => Some(Self::Rock),
            "classical" | "古典" => Some(Self::Classical),
            _ => None,
        }
    }

    /// Wire value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pop => "pop",
            Self::Rock => "rock",
            Self::Classical => "classical",
        }
    }
}

impl std::fmt::Display for MusicPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
