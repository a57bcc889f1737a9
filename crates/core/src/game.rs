//! Game, sport and bookmaker identifiers.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identifier of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(CompactString);

impl GameId {
    pub fn new(id: &str) -> Self {
        Self(CompactString::new(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of a price source (e.g. `draftkings`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bookmaker(CompactString);

impl Bookmaker {
    pub fn new(key: &str) -> Self {
        Self(CompactString::new(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bookmaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Bookmaker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Sport category key, used for partitioning only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sport(CompactString);

impl Sport {
    pub const NBA: &'static str = "basketball_nba";
    pub const NFL: &'static str = "americanfootball_nfl";

    pub fn new(key: &str) -> Self {
        Self(CompactString::new(key))
    }

    pub fn nba() -> Self {
        Self::new(Self::NBA)
    }

    pub fn nfl() -> Self {
        Self::new(Self::NFL)
    }

    pub fn key(&self) -> &str {
        &self.0
    }

    /// Short league label for log lines. Unknown keys are returned as-is.
    pub fn label(&self) -> &str {
        match self.key() {
            Self::NBA => "NBA",
            Self::NFL => "NFL",
            other => other,
        }
    }

    /// Sports ingested when nothing else is configured.
    pub fn defaults() -> Vec<Sport> {
        vec![Self::nba(), Self::nfl()]
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sport {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
