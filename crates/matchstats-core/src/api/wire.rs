// Upstream wire types: serde shapes for the JSON documents the statistics
// API returns. Domain code reads these through the mapping functions in the
// history, extract, lookup and team modules; nothing here depends on field
// order.
use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Match history  (players/{id}/history)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct HistoryPage {
    #[serde(default)]
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct HistoryItem {
    #[serde(default)]
    pub match_id: String,
    pub competition_type: Option<String>,
    pub competition_name: Option<String>,
    /// Unix seconds.
    pub finished_at: Option<i64>,
}

// ---------------------------------------------------------------------------
// Match detail  (matches/{id}/stats)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MatchStatsResponse {
    #[serde(default)]
    pub rounds: Vec<MatchRound>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MatchRound {
    #[serde(default)]
    pub teams: Vec<RoundTeam>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RoundTeam {
    #[serde(default)]
    pub players: Vec<RoundPlayer>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RoundPlayer {
    #[serde(default)]
    pub player_id: String,
    pub nickname: Option<String>,
    /// Human-readable stat names ("Kills", "Headshots %", ...) to values that
    /// arrive either as strings or as bare numbers.
    pub player_stats: Option<HashMap<String, Value>>,
}

// ---------------------------------------------------------------------------
// Players  (players/{id}, players?nickname=, search/players)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlayerResponse {
    pub player_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub games: HashMap<String, PlayerGame>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlayerGame {
    pub faceit_elo: Option<i64>,
    pub skill_level: Option<i64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlayerSearchPage {
    #[serde(default)]
    pub items: Vec<PlayerSearchItem>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlayerSearchItem {
    pub player_id: Option<String>,
    pub nickname: Option<String>,
}

// ---------------------------------------------------------------------------
// Teams  (teams/{id}, teams/{id}/stats/{game}, search/teams)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamResponse {
    pub team_id: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub members: Vec<TeamMemberEntry>,
    #[serde(default)]
    pub games: Vec<TeamGameEntry>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamMemberEntry {
    pub user_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamGameEntry {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamStatsResponse {
    #[serde(default)]
    pub lifetime: HashMap<String, Value>,
    #[serde(default)]
    pub segments: Vec<TeamSegment>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamSegment {
    pub label: Option<String>,
    #[serde(default)]
    pub stats: HashMap<String, Value>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamSearchPage {
    #[serde(default)]
    pub items: Vec<TeamSearchItem>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamSearchItem {
    pub team_id: Option<String>,
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Render a scalar JSON value as the text the upstream would have sent.
///
/// Strings are returned as-is, numbers and booleans in their JSON spelling.
/// Arrays, objects and null yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
