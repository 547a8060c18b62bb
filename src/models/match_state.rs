use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::MatchContext;

/// Stable identifier of a live match as reported by the backend
///
/// The backend sends either a number or a string; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for MatchId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for MatchId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => MatchId::from(n),
            RawId::Text(s) => MatchId(s),
        })
    }
}

/// Point-in-time view of one live match, rebuilt on every poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Match ID
    pub id: MatchId,

    /// Home team name
    pub home_team: String,

    /// Away team name
    pub away_team: String,

    /// Home goals
    pub home_score: u32,

    /// Away goals
    pub away_score: u32,

    /// Numeric minute string, or one of "HT", "FT", "NS"
    pub minute: String,

    /// Backend status text (e.g. "IN PLAY"), if any
    pub status: Option<String>,

    /// Competition ID, if known
    pub competition_id: Option<i64>,

    /// Competition display name
    pub competition_name: String,
}

impl MatchSnapshot {
    /// Combined "home-away" score used for goal detection
    pub fn score_key(&self) -> String {
        format!("{}-{}", self.home_score, self.away_score)
    }

    /// Denormalized fields carried alongside queued events
    pub fn context(&self) -> MatchContext {
        MatchContext {
            id: self.id.clone(),
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            home_score: self.home_score,
            away_score: self.away_score,
            minute: self.minute.clone(),
            competition: self.competition_name.clone(),
            status: self.status.clone(),
        }
    }
}

/// Map of match id -> last seen snapshot
pub type TrackedMatches = std::collections::HashMap<MatchId, MatchSnapshot>;
