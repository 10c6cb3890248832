// Typed endpoint client: builds upstream URLs and decodes responses.

use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;

use super::wire::{
    HistoryPage, MatchStatsResponse, PlayerResponse, PlayerSearchPage, TeamResponse,
    TeamSearchPage, TeamStatsResponse,
};
use super::{ApiError, ApiResult, RequestSender};

pub const DEFAULT_BASE_URL: &str = "https://open.faceit.com/data/v4";
pub const DEFAULT_GAME: &str = "cs2";

/// Statistics API client over any [`RequestSender`].
///
/// Cheap to clone; clones share the underlying sender.
#[derive(Clone)]
pub struct StatsApi {
    sender: Arc<dyn RequestSender>,
    base_url: String,
    game: String,
}

impl fmt::Debug for StatsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsApi")
            .field("base_url", &self.base_url)
            .field("game", &self.game)
            .finish_non_exhaustive()
    }
}

impl StatsApi {
    pub fn new(
        sender: Arc<dyn RequestSender>,
        base_url: impl Into<String>,
        game: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            sender,
            base_url,
            game: game.into(),
        }
    }

    /// Game identifier every history and team-stats request is scoped to.
    pub fn game(&self) -> &str {
        &self.game
    }

    // -- URL builders --------------------------------------------------------

    pub fn history_url(&self, player_id: &str, offset: usize, limit: usize) -> ApiResult<String> {
        self.endpoint(
            &["players", player_id, "history"],
            &[
                ("game", self.game.clone()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ],
        )
    }

    pub fn match_stats_url(&self, match_id: &str) -> ApiResult<String> {
        self.endpoint(&["matches", match_id, "stats"], &[])
    }

    pub fn player_url(&self, player_id: &str) -> ApiResult<String> {
        self.endpoint(&["players", player_id], &[])
    }

    pub fn player_lookup_url(&self, nickname: &str) -> ApiResult<String> {
        self.endpoint(&["players"], &[("nickname", nickname.to_owned())])
    }

    pub fn player_search_url(&self, nickname: &str) -> ApiResult<String> {
        self.endpoint(
            &["search", "players"],
            &[
                ("nickname", nickname.to_owned()),
                ("offset", "0".into()),
                ("limit", "1".into()),
            ],
        )
    }

    pub fn team_url(&self, team_id: &str) -> ApiResult<String> {
        self.endpoint(&["teams", team_id], &[])
    }

    pub fn team_stats_url(&self, team_id: &str) -> ApiResult<String> {
        self.endpoint(&["teams", team_id, "stats", self.game.as_str()], &[])
    }

    pub fn team_search_url(&self, name: &str) -> ApiResult<String> {
        self.endpoint(
            &["search", "teams"],
            &[
                ("nickname", name.to_owned()),
                ("game", self.game.clone()),
                ("offset", "0".into()),
                ("limit", "50".into()),
            ],
        )
    }

    // -- Endpoints -----------------------------------------------------------

    pub async fn history_page(
        &self,
        player_id: &str,
        offset: usize,
        limit: usize,
    ) -> ApiResult<HistoryPage> {
        self.get(&self.history_url(player_id, offset, limit)?).await
    }

    pub async fn match_stats(&self, match_id: &str) -> ApiResult<MatchStatsResponse> {
        self.get(&self.match_stats_url(match_id)?).await
    }

    pub async fn player(&self, player_id: &str) -> ApiResult<PlayerResponse> {
        self.get(&self.player_url(player_id)?).await
    }

    pub async fn player_by_nickname(&self, nickname: &str) -> ApiResult<PlayerResponse> {
        self.get(&self.player_lookup_url(nickname)?).await
    }

    pub async fn search_players(&self, nickname: &str) -> ApiResult<PlayerSearchPage> {
        self.get(&self.player_search_url(nickname)?).await
    }

    pub async fn team(&self, team_id: &str) -> ApiResult<TeamResponse> {
        self.get(&self.team_url(team_id)?).await
    }

    pub async fn team_stats(&self, team_id: &str) -> ApiResult<TeamStatsResponse> {
        self.get(&self.team_stats_url(team_id)?).await
    }

    pub async fn search_teams(&self, name: &str) -> ApiResult<TeamSearchPage> {
        self.get(&self.team_search_url(name)?).await
    }

    // -- Internals -----------------------------------------------------------

    /// Join `segments` onto the base URL. Each segment is percent-encoded on
    /// its own, so ids containing `/`, `?` or `#` stay inside their segment.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> ApiResult<String> {
        let invalid = |message: String| ApiError::InvalidUrl {
            url: self.base_url.clone(),
            message,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let body = self.sender.send(url).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            url: url.to_owned(),
            source: e,
        })
    }
}
