use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{MatchId, MatchSnapshot};

/// Anything that can report the current list of live matches
#[async_trait]
pub trait LiveScoreSource: Send + Sync {
    async fn fetch_live_matches(&self) -> Result<Vec<MatchSnapshot>>;
}

/// Client for the dashboard backend's live scores endpoint
pub struct LiveScoreClient {
    client: Client,
    base_url: String,
}

/// Live match as returned by `/api/livescores`
#[derive(Debug, Deserialize)]
struct LiveMatchResponse {
    id: MatchId,
    #[serde(default)]
    home_team: Option<TeamResponse>,
    #[serde(default)]
    away_team: Option<TeamResponse>,
    #[serde(default)]
    minute: Option<Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    competition_id: Option<i64>,
    #[serde(default)]
    competition_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    score: Option<Value>,
}

impl LiveScoreClient {
    /// Create a new client
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LiveScoreSource for LiveScoreClient {
    async fn fetch_live_matches(&self) -> Result<Vec<MatchSnapshot>> {
        let url = format!("{}/api/livescores", self.base_url);

        debug!("Fetching live scores from {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to fetch live scores")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Live scores API error: {} - {}", status, text);
        }

        let entries: Vec<Value> = response
            .json()
            .await
            .context("Failed to parse live scores response")?;

        debug!("Backend returned {} live matches", entries.len());

        Ok(convert_entries(entries))
    }
}

/// Parse a raw JSON body the same way the client does
pub fn parse_live_matches(body: &str) -> Result<Vec<MatchSnapshot>> {
    let entries: Vec<Value> =
        serde_json::from_str(body).context("Failed to parse live scores response")?;
    Ok(convert_entries(entries))
}

/// Convert every usable entry; an entry without a valid id is skipped
fn convert_entries(entries: Vec<Value>) -> Vec<MatchSnapshot> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<LiveMatchResponse>(entry) {
            Ok(data) => Some(convert_match(data)),
            Err(e) => {
                warn!("Skipping malformed live match: {}", e);
                None
            }
        })
        .collect()
}

/// Convert a backend match to our model, defaulting anything missing
fn convert_match(data: LiveMatchResponse) -> MatchSnapshot {
    let (home_team, home_score) = split_team(data.home_team, "Home");
    let (away_team, away_score) = split_team(data.away_team, "Away");

    MatchSnapshot {
        id: data.id,
        home_team,
        away_team,
        home_score,
        away_score,
        minute: parse_minute(data.minute.as_ref()),
        status: data.status,
        competition_id: data.competition_id,
        competition_name: data.competition_name.unwrap_or_default(),
    }
}

fn split_team(team: Option<TeamResponse>, fallback: &str) -> (String, u32) {
    let Some(team) = team else {
        return (fallback.to_string(), 0);
    };

    let name = team
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());

    (name, parse_score(team.score.as_ref()))
}

/// Scores arrive as numbers or numeric strings; anything else is 0
fn parse_score(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn parse_minute(value: Option<&Value>) -> String {
    let minute = match value {
        Some(Value::String(s)) => s.replace('\u{200e}', "").trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    if minute.is_empty() {
        "0".to_string()
    } else {
        minute
    }
}
