// Paginated match-history walk over the upstream history endpoint.

use chrono::{DateTime, TimeZone, Utc};
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::wire::HistoryItem;
use crate::api::{ApiError, StatsApi};

/// Upstream page limit for the history endpoint.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionType {
    Matchmaking,
    Championship,
    Other,
}

impl CompetitionType {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "matchmaking" => CompetitionType::Matchmaking,
            "championship" => CompetitionType::Championship,
            _ => CompetitionType::Other,
        }
    }
}

/// One entry from a history page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub match_id: String,
    pub competition_type: CompetitionType,
    /// Free text; empty when the upstream omitted it.
    pub competition_name: String,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<HistoryItem> for MatchSummary {
    fn from(item: HistoryItem) -> Self {
        MatchSummary {
            match_id: item.match_id,
            competition_type: item
                .competition_type
                .as_deref()
                .map(CompetitionType::from_wire)
                .unwrap_or(CompetitionType::Other),
            competition_name: item.competition_name.unwrap_or_default(),
            finished_at: item
                .finished_at
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }
}

/// Why a history walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEnd {
    /// The upstream returned an empty page.
    Exhausted,
    /// The configured match cap was reached.
    CapReached,
    /// A page request failed; earlier pages are kept.
    Failed,
}

/// Lazy, single-use walk over a player's match history.
///
/// Each call to [`HistoryPager::next_page`] issues at most one request.
/// Offsets advance by the page size regardless of how many items a page
/// carried, and only an empty page signals the true end of the history.
#[derive(Debug)]
pub struct HistoryPager<'a> {
    api: &'a StatsApi,
    player_id: String,
    page_size: usize,
    max_matches: Option<usize>,
    offset: usize,
    yielded: usize,
    pages_fetched: usize,
    end: Option<HistoryEnd>,
    failure: Option<ApiError>,
}

impl<'a> HistoryPager<'a> {
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`. `max_matches` of `None`
    /// walks the whole history.
    pub fn new(
        api: &'a StatsApi,
        player_id: impl Into<String>,
        page_size: usize,
        max_matches: Option<usize>,
    ) -> Self {
        Self {
            api,
            player_id: player_id.into(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            max_matches,
            offset: 0,
            yielded: 0,
            pages_fetched: 0,
            end: None,
            failure: None,
        }
    }

    /// Fetch the next page of summaries, or `None` once the walk has ended.
    pub async fn next_page(&mut self) -> Option<Vec<MatchSummary>> {
        if self.end.is_some() {
            return None;
        }
        if self.max_matches.is_some_and(|cap| self.yielded >= cap) {
            self.end = Some(HistoryEnd::CapReached);
            return None;
        }

        let offset = self.offset;
        self.offset += self.page_size;
        self.pages_fetched += 1;

        let page = match self
            .api
            .history_page(&self.player_id, offset, self.page_size)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!(player = %self.player_id, offset, "history page failed: {e}");
                self.end = Some(HistoryEnd::Failed);
                self.failure = Some(e);
                return None;
            }
        };

        if page.items.is_empty() {
            debug!(player = %self.player_id, offset, "history exhausted");
            self.end = Some(HistoryEnd::Exhausted);
            return None;
        }

        let mut summaries: Vec<MatchSummary> = page
            .items
            .into_iter()
            .filter(|item| !item.match_id.is_empty())
            .map(MatchSummary::from)
            .collect();

        if let Some(cap) = self.max_matches {
            summaries.truncate(cap.saturating_sub(self.yielded));
        }
        self.yielded += summaries.len();
        debug!(
            player = %self.player_id,
            offset,
            count = summaries.len(),
            total = self.yielded,
            "history page"
        );
        Some(summaries)
    }

    /// Total summaries handed out so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Number of page requests issued, including the terminating one.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn end(&self) -> Option<HistoryEnd> {
        self.end
    }

    /// Take the error that ended the walk, if it ended on a failed request.
    pub fn take_failure(&mut self) -> Option<ApiError> {
        self.failure.take()
    }

    /// Flatten the remaining pages into a stream of individual summaries.
    pub fn into_stream(self) -> impl Stream<Item = MatchSummary> + 'a {
        stream::unfold(self, |mut pager| async move {
            pager.next_page().await.map(|page| (page, pager))
        })
        .flat_map(stream::iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn competition_type_maps_known_values() {
        assert_eq!(CompetitionType::from_wire("matchmaking"), CompetitionType::Matchmaking);
        assert_eq!(CompetitionType::from_wire("championship"), CompetitionType::Championship);
        assert_eq!(CompetitionType::from_wire("hub"), CompetitionType::Other);
        assert_eq!(CompetitionType::from_wire(""), CompetitionType::Other);
    }

    #[test]
    fn summary_from_wire_item_fills_defaults() {
        let summary = MatchSummary::from(HistoryItem {
            match_id: "1-abc".into(),
            competition_type: None,
            competition_name: None,
            finished_at: Some(1_700_000_000),
        });
        assert_eq!(summary.competition_type, CompetitionType::Other);
        assert!(summary.competition_name.is_empty());
        assert_eq!(summary.finished_at.map(|t| t.timestamp()), Some(1_700_000_000));
    }
}
