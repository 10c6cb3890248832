// Team overview: roster with elo, lifetime record, and per-map records.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::aggregate::round2;
use crate::api::wire::{scalar_text, TeamSegment, TeamStatsResponse};
use crate::api::{ApiResult, StatsApi};

/// Default deadline for roster elo enrichment.
pub const DEFAULT_ROSTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of recent results kept in [`TeamLifetime::recent_results`].
const RECENT_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMember {
    pub player_id: String,
    pub nickname: String,
    pub avatar: Option<String>,
    /// Zero when the lookup failed or did not finish in time.
    pub elo: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamInfo {
    pub team_id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamLifetime {
    pub matches: u32,
    pub wins: u32,
    /// Percentage, two decimals. Zero when no matches were played.
    pub win_rate: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Most recent first; `true` is a win.
    pub recent_results: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRecord {
    pub map: String,
    pub matches: u32,
    pub wins: u32,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamOverview {
    pub info: TeamInfo,
    pub lifetime: TeamLifetime,
    pub maps: Vec<MapRecord>,
}

/// Fetch team info and lifetime stats concurrently, then enrich the roster
/// with each member's elo under `roster_timeout`.
pub async fn team_overview(
    api: &StatsApi,
    team_id: &str,
    roster_timeout: Duration,
) -> ApiResult<TeamOverview> {
    let (team, stats) = tokio::try_join!(api.team(team_id), api.team_stats(team_id))?;

    let mut members: Vec<TeamMember> = team
        .members
        .into_iter()
        .filter_map(|m| {
            Some(TeamMember {
                player_id: m.user_id.filter(|id| !id.is_empty())?,
                nickname: m.nickname.unwrap_or_default(),
                avatar: m.avatar,
                elo: 0,
            })
        })
        .collect();
    enrich_roster(api, &mut members, roster_timeout).await;

    let info = TeamInfo {
        team_id: team.team_id.unwrap_or_else(|| team_id.to_owned()),
        name: team.name.unwrap_or_default(),
        avatar: team.avatar,
        members,
    };
    info!(team_id, name = %info.name, members = info.members.len(), "team overview loaded");

    Ok(TeamOverview {
        info,
        lifetime: lifetime_record(&stats),
        maps: map_records(&stats.segments),
    })
}

/// Look up every member's elo concurrently. Members whose lookup fails or is
/// still pending at the deadline keep elo 0.
async fn enrich_roster(api: &StatsApi, members: &mut [TeamMember], timeout: Duration) {
    let mut lookups: FuturesUnordered<_> = members
        .iter()
        .enumerate()
        .map(|(idx, member)| {
            let player_id = member.player_id.clone();
            async move { (idx, api.player(&player_id).await) }
        })
        .collect();

    let total = members.len();
    let mut settled = 0;
    let deadline = Instant::now() + timeout;
    loop {
        let next = match tokio::time::timeout_at(deadline, lookups.next()).await {
            Ok(next) => next,
            Err(_) => {
                warn!(pending = total - settled, "roster elo lookup timed out");
                break;
            }
        };
        let Some((idx, result)) = next else { break };
        settled += 1;
        match result {
            Ok(player) => {
                members[idx].elo = player
                    .games
                    .get(api.game())
                    .and_then(|g| g.faceit_elo)
                    .unwrap_or(0);
            }
            Err(e) => debug!(player_id = %members[idx].player_id, "member elo lookup failed: {e}"),
        }
    }
}

fn lifetime_record(stats: &TeamStatsResponse) -> TeamLifetime {
    let lifetime = &stats.lifetime;
    let matches = count(lifetime, "Matches");
    let wins = count(lifetime, "Wins");
    let recent_results = match lifetime.get("Recent Results") {
        Some(Value::Array(results)) => results
            .iter()
            .take(RECENT_RESULTS)
            .map(|r| scalar_text(r).as_deref() == Some("1"))
            .collect(),
        _ => Vec::new(),
    };
    TeamLifetime {
        matches,
        wins,
        win_rate: win_rate(wins, matches),
        current_streak: count(lifetime, "Current Win Streak"),
        longest_streak: count(lifetime, "Longest Win Streak"),
        recent_results,
    }
}

/// Per-map records, skipping unlabeled and wingman segments.
fn map_records(segments: &[TeamSegment]) -> Vec<MapRecord> {
    segments
        .iter()
        .filter_map(|segment| {
            let label = segment.label.as_deref().filter(|l| !l.is_empty())?;
            if label.to_lowercase().contains("wingman") {
                return None;
            }
            let matches = count(&segment.stats, "Matches");
            let wins = count(&segment.stats, "Wins");
            Some(MapRecord {
                map: label.to_owned(),
                matches,
                wins,
                win_rate: win_rate(wins, matches),
            })
        })
        .collect()
}

pub fn win_rate(wins: u32, matches: u32) -> f64 {
    if matches == 0 {
        return 0.0;
    }
    round2(f64::from(wins) * 100.0 / f64::from(matches))
}

fn count(stats: &HashMap<String, Value>, key: &str) -> u32 {
    stats
        .get(key)
        .and_then(scalar_text)
        .and_then(|text| text.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stats(json: Value) -> TeamStatsResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn win_rate_is_zero_without_matches() {
        assert_eq!(win_rate(0, 0), 0.0);
        assert_eq!(win_rate(2, 3), 66.67);
        assert_eq!(win_rate(5, 5), 100.0);
    }

    #[test]
    fn lifetime_reads_string_and_numeric_counts() {
        let s = stats(json!({
            "lifetime": {
                "Matches": "40",
                "Wins": 30,
                "Current Win Streak": "3",
                "Longest Win Streak": "9",
                "Recent Results": ["1", "0", "1", "1", "0", "1"]
            }
        }));
        let lifetime = lifetime_record(&s);
        assert_eq!(lifetime.matches, 40);
        assert_eq!(lifetime.wins, 30);
        assert_eq!(lifetime.win_rate, 75.0);
        assert_eq!(lifetime.current_streak, 3);
        assert_eq!(lifetime.longest_streak, 9);
        assert_eq!(lifetime.recent_results, vec![true, false, true, true, false]);
    }

    #[test]
    fn empty_lifetime_defaults_to_zero() {
        let lifetime = lifetime_record(&stats(json!({})));
        assert_eq!(lifetime.matches, 0);
        assert_eq!(lifetime.win_rate, 0.0);
        assert!(lifetime.recent_results.is_empty());
    }

    #[test]
    fn map_records_skip_wingman_and_unlabeled_segments() {
        let s = stats(json!({ "segments": [
            { "label": "de_mirage", "stats": { "Matches": "10", "Wins": "6" } },
            { "label": "Wingman de_shortdust", "stats": { "Matches": "4", "Wins": "4" } },
            { "label": "", "stats": { "Matches": "1", "Wins": "1" } },
            { "stats": { "Matches": "1", "Wins": "0" } },
            { "label": "de_nuke", "stats": { "Matches": "0" } }
        ] }));
        let maps = map_records(&s.segments);
        let names: Vec<&str> = maps.iter().map(|m| m.map.as_str()).collect();
        assert_eq!(names, vec!["de_mirage", "de_nuke"]);
        assert_eq!(maps[0].win_rate, 60.0);
        assert_eq!(maps[1].win_rate, 0.0);
    }
}
