// Player and team identifier resolution, plus player profiles.

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{ApiError, ApiResult, StatsApi};

/// Resolved player identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRef {
    pub player_id: String,
    pub nickname: String,
}

/// Player profile for the API's configured game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerProfile {
    pub player_id: String,
    pub nickname: String,
    pub avatar: Option<String>,
    /// Zero when the player has no record for the game.
    pub elo: i64,
    pub skill_level: Option<i64>,
}

/// Resolve a nickname to a player id.
///
/// Tries the exact nickname lookup first and falls back to the first search
/// hit.
pub async fn resolve_player(api: &StatsApi, nickname: &str) -> ApiResult<PlayerRef> {
    match api.player_by_nickname(nickname).await {
        Ok(player) => {
            if let Some(player_id) = player.player_id.filter(|id| !id.is_empty()) {
                return Ok(PlayerRef {
                    player_id,
                    nickname: player.nickname.unwrap_or_else(|| nickname.to_owned()),
                });
            }
        }
        Err(e) => debug!(nickname, "exact nickname lookup failed: {e}"),
    }

    let page = api.search_players(nickname).await?;
    page.items
        .into_iter()
        .find_map(|item| {
            let player_id = item.player_id.filter(|id| !id.is_empty())?;
            Some(PlayerRef {
                player_id,
                nickname: item.nickname.unwrap_or_else(|| nickname.to_owned()),
            })
        })
        .ok_or_else(|| ApiError::NotFound(format!("player `{nickname}`")))
}

pub async fn player_profile(api: &StatsApi, player_id: &str) -> ApiResult<PlayerProfile> {
    let player = api.player(player_id).await?;
    let game = player.games.get(api.game());
    Ok(PlayerProfile {
        player_id: player.player_id.unwrap_or_else(|| player_id.to_owned()),
        nickname: player.nickname.unwrap_or_default(),
        avatar: player.avatar,
        elo: game.and_then(|g| g.faceit_elo).unwrap_or(0),
        skill_level: game.and_then(|g| g.skill_level),
    })
}

/// Resolve a team URL or exact team name to a team id.
///
/// A URL with a `/teams/` or `/team/` segment is looked up directly and
/// accepted when the team plays the configured game. Anything else, or a URL
/// whose lookup fails, falls back to a name search that only accepts an
/// exact, case-sensitive name match.
pub async fn resolve_team(api: &StatsApi, input: &str) -> ApiResult<String> {
    let input = input.trim();
    if let Some(team_id) = team_id_from_url(input) {
        match api.team(team_id).await {
            Ok(team) => {
                let plays_game = team.games.iter().any(|g| {
                    g.name
                        .as_deref()
                        .is_some_and(|name| name.eq_ignore_ascii_case(api.game()))
                });
                match team.team_id {
                    Some(id) if plays_game && !id.is_empty() => return Ok(id),
                    _ => debug!(team_id, game = api.game(), "team does not list the game"),
                }
            }
            Err(e) => warn!(team_id, "team lookup from url failed: {e}"),
        }
    }

    let page = api.search_teams(input).await?;
    page.items
        .into_iter()
        .find(|item| item.name.as_deref() == Some(input))
        .and_then(|item| item.team_id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::NotFound(format!("team `{input}` (names are case sensitive)")))
}

/// Path segment following `/teams/` or `/team/`, if any.
pub fn team_id_from_url(input: &str) -> Option<&str> {
    ["/teams/", "/team/"].iter().find_map(|marker| {
        let (_, rest) = input.split_once(marker)?;
        let id = rest.split(['/', '?', '#']).next()?;
        (!id.is_empty()).then_some(id)
    })
}
