// Per-match stat extraction: fetch one match's detail, find the target
// player's stat block, and turn the schema fields into a numeric record.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::aggregate::StatRecord;
use crate::api::wire::{scalar_text, MatchStatsResponse};
use crate::api::{ApiError, StatsApi};
use crate::schema::StatSchema;

/// Why a match produced no record. Every variant means "skip this match".
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("match detail unavailable: {0}")]
    Fetch(#[from] ApiError),

    #[error("match detail has no rounds")]
    NoRounds,

    #[error("player {0} not found in the first round's rosters")]
    PlayerNotFound(String),

    #[error("player {0} has no stat block")]
    NoStats(String),
}

/// Fetch match detail and extract `player_id`'s stats for `schema`.
pub async fn extract(
    api: &StatsApi,
    match_id: &str,
    player_id: &str,
    schema: &StatSchema,
) -> Result<StatRecord, SkipReason> {
    let detail = api.match_stats(match_id).await?;
    let record = extract_from_detail(&detail, player_id, schema)?;
    debug!(match_id, player_id, "extracted match stats");
    Ok(record)
}

/// Extract a record from an already-fetched match detail.
///
/// Only the first round is consulted: the upstream embeds match-level
/// cumulative stats in the first round's player entries.
pub fn extract_from_detail(
    detail: &MatchStatsResponse,
    player_id: &str,
    schema: &StatSchema,
) -> Result<StatRecord, SkipReason> {
    let round = detail.rounds.first().ok_or(SkipReason::NoRounds)?;
    let player = round
        .teams
        .iter()
        .flat_map(|team| team.players.iter())
        .find(|p| p.player_id == player_id)
        .ok_or_else(|| SkipReason::PlayerNotFound(player_id.to_owned()))?;

    let stats = player.player_stats.as_ref().ok_or_else(|| {
        SkipReason::NoStats(player.nickname.clone().unwrap_or_else(|| player_id.to_owned()))
    })?;
    Ok(record_from_stats(stats, schema))
}

/// Map a raw `player_stats` object onto the schema. Absent or unparsable
/// fields become zero, so the record always has every schema field.
pub fn record_from_stats(stats: &HashMap<String, Value>, schema: &StatSchema) -> StatRecord {
    let values = schema
        .fields()
        .iter()
        .map(|field| {
            let raw = stats
                .get(&field.name)
                .and_then(scalar_text)
                .map(|text| parse_stat_value(&text))
                .unwrap_or(0.0);
            normalize(raw, field.percentage)
        })
        .collect();
    StatRecord::from_values(values)
}

/// Parse an upstream stat value, stripping a trailing `%`. Unparsable or
/// non-finite input yields zero.
pub fn parse_stat_value(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    match number.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Collapse fraction and percentage spellings of the same stat onto 0-100.
///
/// Percentage-typed values at or below 1 are treated as fractions and scaled
/// by 100; anything larger is already a percentage.
pub fn normalize(value: f64, percentage: bool) -> f64 {
    if percentage && value <= 1.0 {
        value * 100.0
    } else {
        value
    }
}
