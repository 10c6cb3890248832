// Pipeline orchestration: history pagination, bounded-concurrency extraction
// per page, classification into groups, and averaging.
//
// Pages are processed strictly in sequence. Within a page, extraction calls
// fan out through `buffer_unordered` and their results are folded by a single
// reducer loop that owns the run's `Aggregator`.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::aggregate::{AggregateError, Aggregator, AveragedStatRecord, GroupKey};
use crate::api::{ApiError, StatsApi};
use crate::classify::{
    Classification, LeagueKey, LeagueMatch, MatchClassifier, DEFAULT_LEAGUE_MARKER,
};
use crate::extract::extract;
use crate::history::{HistoryPager, MatchSummary, MAX_PAGE_SIZE};
use crate::schema::StatSchema;

/// Upper bound on the match cap of a basic/full stats run.
pub const MAX_STATS_MATCHES: usize = 300;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The very first history page could not be fetched.
    #[error("statistics API unreachable: {source}")]
    Unreachable { source: ApiError },

    #[error("invalid league marker `{marker}`: {source}")]
    InvalidMarker {
        marker: String,
        source: regex::Error,
    },

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Tunables for one pipeline instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// History page size, clamped to `1..=100`.
    pub page_size: usize,
    /// Match cap for basic/full runs, clamped to `1..=300`.
    pub max_matches: usize,
    /// Maximum extraction calls in flight within one page batch.
    pub concurrency: usize,
    /// Deadline for one page batch. `None` waits for every extraction.
    pub batch_timeout: Option<Duration>,
    /// Substring identifying the tracked league in competition names.
    pub league_marker: String,
    /// Fold unparseable league championships into an `Unclassified` group
    /// and into `Overall` instead of only counting them.
    pub count_unclassified: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_matches: 100,
            concurrency: 20,
            batch_timeout: None,
            league_marker: DEFAULT_LEAGUE_MARKER.to_owned(),
            count_unclassified: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Earliest and latest finish time among contributing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
}

impl MatchSpan {
    fn include(span: &mut Option<MatchSpan>, at: Option<DateTime<Utc>>) {
        let Some(at) = at else { return };
        *span = Some(match *span {
            Some(s) => MatchSpan {
                first: s.first.min(at),
                last: s.last.max(at),
            },
            None => MatchSpan { first: at, last: at },
        });
    }
}

/// Result of a basic or full stats run.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub player_id: String,
    pub schema: String,
    /// Summaries handed out by the history walk.
    pub fetched: usize,
    /// Matchmaking matches among them.
    pub qualifying: usize,
    pub aggregated: usize,
    pub skipped: usize,
    /// History ended early on an upstream failure.
    pub truncated: bool,
    /// Absent when no match was aggregated.
    pub record: Option<AveragedStatRecord>,
    pub span: Option<MatchSpan>,
}

/// Averages for one league season/division bucket.
#[derive(Debug, Clone, Serialize)]
pub struct LeagueSeason {
    /// First key seen for the bucket; `game_type` varies between matches.
    pub key: LeagueKey,
    pub group: String,
    pub record: AveragedStatRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueReport {
    pub player_id: String,
    pub schema: String,
    /// Newest season first, then by group key.
    pub seasons: Vec<LeagueSeason>,
    pub overall: Option<AveragedStatRecord>,
    /// Only populated when unclassified matches are counted.
    pub unclassified: Option<AveragedStatRecord>,
    pub fetched: usize,
    /// Matches that contributed to `overall`.
    pub total_matches: usize,
    /// League-marker championships whose name did not parse.
    pub unclassified_count: usize,
    pub skipped: usize,
    pub truncated: bool,
    pub span: Option<MatchSpan>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// One extraction job: a match and the groups its record folds into.
struct Job {
    summary: MatchSummary,
    groups: Vec<GroupKey>,
}

#[derive(Debug, Default)]
struct Tally {
    aggregated: usize,
    skipped: usize,
    span: Option<MatchSpan>,
}

/// Runs stats and league aggregations against one API client.
///
/// Holds no per-run state; every run owns a fresh [`Aggregator`], so
/// concurrent runs never share accumulators.
#[derive(Debug, Clone)]
pub struct StatsPipeline {
    api: StatsApi,
    settings: PipelineSettings,
    classifier: MatchClassifier,
}

impl StatsPipeline {
    pub fn new(api: StatsApi, settings: PipelineSettings) -> Result<Self, PipelineError> {
        let classifier = MatchClassifier::new(&settings.league_marker).map_err(|source| {
            PipelineError::InvalidMarker {
                marker: settings.league_marker.clone(),
                source,
            }
        })?;
        Ok(Self {
            api,
            settings,
            classifier,
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn classifier(&self) -> &MatchClassifier {
        &self.classifier
    }

    /// Average the player's matchmaking matches into a single overall record.
    pub async fn run_stats(
        &self,
        player_id: &str,
        schema: StatSchema,
    ) -> Result<StatsReport, PipelineError> {
        let cap = self.settings.max_matches.clamp(1, MAX_STATS_MATCHES);
        info!(player_id, schema = schema.name(), cap, "stats run started");

        let mut pager = HistoryPager::new(&self.api, player_id, self.settings.page_size, Some(cap));
        let mut aggregator = Aggregator::new(schema);
        let mut tally = Tally::default();
        let mut qualifying = 0;

        while let Some(page) = pager.next_page().await {
            let jobs: Vec<Job> = page
                .into_iter()
                .filter(|s| self.classifier.classify(s) == Classification::Matchmaking)
                .map(|summary| Job {
                    summary,
                    groups: vec![GroupKey::Overall],
                })
                .collect();
            qualifying += jobs.len();
            self.run_batch(player_id, jobs, &mut aggregator, &mut tally)
                .await?;
        }
        let truncated = history_outcome(&mut pager)?;

        let schema_name = aggregator.schema().name().to_owned();
        let mut groups = aggregator.finalize();
        let report = StatsReport {
            player_id: player_id.to_owned(),
            schema: schema_name,
            fetched: pager.yielded(),
            qualifying,
            aggregated: tally.aggregated,
            skipped: tally.skipped,
            truncated,
            record: groups.remove(&GroupKey::Overall),
            span: tally.span,
        };
        info!(
            player_id,
            fetched = report.fetched,
            qualifying = report.qualifying,
            aggregated = report.aggregated,
            skipped = report.skipped,
            truncated = report.truncated,
            "stats run finished"
        );
        Ok(report)
    }

    /// Average the player's tracked-league matches per season/division and
    /// overall. Walks the whole history.
    pub async fn run_league(
        &self,
        player_id: &str,
        schema: StatSchema,
    ) -> Result<LeagueReport, PipelineError> {
        info!(player_id, schema = schema.name(), "league run started");

        let mut pager = HistoryPager::new(&self.api, player_id, self.settings.page_size, None);
        let mut aggregator = Aggregator::new(schema);
        let mut tally = Tally::default();
        let mut keys: BTreeMap<String, LeagueKey> = BTreeMap::new();
        let mut unclassified_count = 0;

        while let Some(page) = pager.next_page().await {
            let mut jobs = Vec::new();
            for summary in page {
                let groups = match self.classifier.classify(&summary) {
                    Classification::Championship(LeagueMatch::Classified(key)) => {
                        let group = key.group_key();
                        keys.entry(group.clone()).or_insert(key);
                        vec![GroupKey::League(group), GroupKey::Overall]
                    }
                    Classification::Championship(LeagueMatch::Unclassified) => {
                        unclassified_count += 1;
                        debug!(
                            match_id = %summary.match_id,
                            name = %summary.competition_name,
                            "unclassified league match"
                        );
                        if !self.settings.count_unclassified {
                            continue;
                        }
                        vec![GroupKey::Unclassified, GroupKey::Overall]
                    }
                    Classification::Matchmaking | Classification::Other => continue,
                };
                jobs.push(Job { summary, groups });
            }
            self.run_batch(player_id, jobs, &mut aggregator, &mut tally)
                .await?;
        }
        let truncated = history_outcome(&mut pager)?;

        let schema_name = aggregator.schema().name().to_owned();
        let mut groups = aggregator.finalize();
        let overall = groups.remove(&GroupKey::Overall);
        let unclassified = groups.remove(&GroupKey::Unclassified);

        let mut seasons: Vec<LeagueSeason> = groups
            .into_iter()
            .filter_map(|(group_key, record)| match group_key {
                GroupKey::League(group) => keys.remove(&group).map(|key| LeagueSeason {
                    key,
                    group,
                    record,
                }),
                GroupKey::Overall | GroupKey::Unclassified => None,
            })
            .collect();
        seasons.sort_by(|a, b| {
            b.key
                .season_number
                .cmp(&a.key.season_number)
                .then_with(|| a.group.cmp(&b.group))
        });

        let report = LeagueReport {
            player_id: player_id.to_owned(),
            schema: schema_name,
            seasons,
            total_matches: overall.as_ref().map_or(0, |r| r.match_count),
            overall,
            unclassified,
            fetched: pager.yielded(),
            unclassified_count,
            skipped: tally.skipped,
            truncated,
            span: tally.span,
        };
        info!(
            player_id,
            seasons = report.seasons.len(),
            total = report.total_matches,
            unclassified = report.unclassified_count,
            skipped = report.skipped,
            truncated = report.truncated,
            "league run finished"
        );
        Ok(report)
    }

    /// Extract one page's jobs concurrently and fold the results.
    ///
    /// On batch timeout the records already folded stay counted and the
    /// unfinished jobs are dropped as skipped.
    async fn run_batch(
        &self,
        player_id: &str,
        jobs: Vec<Job>,
        aggregator: &mut Aggregator,
        tally: &mut Tally,
    ) -> Result<(), PipelineError> {
        if jobs.is_empty() {
            return Ok(());
        }
        let total = jobs.len();
        let api = &self.api;
        let schema = aggregator.schema().clone();
        let schema = &schema;

        let results = stream::iter(jobs)
            .map(|job| async move {
                let outcome = extract(api, &job.summary.match_id, player_id, schema).await;
                (job, outcome)
            })
            .buffer_unordered(self.settings.concurrency.max(1));
        let mut results = std::pin::pin!(results);

        let deadline = self.settings.batch_timeout.map(|t| Instant::now() + t);
        let mut finished = 0;
        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, results.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(
                            player_id,
                            finished,
                            dropped = total - finished,
                            "page batch timed out"
                        );
                        break;
                    }
                },
                None => results.next().await,
            };
            let Some((job, outcome)) = next else { break };
            finished += 1;

            match outcome {
                Ok(record) => {
                    for group in job.groups {
                        aggregator.accumulate(group, &record)?;
                    }
                    tally.aggregated += 1;
                    MatchSpan::include(&mut tally.span, job.summary.finished_at);
                }
                Err(reason) => {
                    warn!(match_id = %job.summary.match_id, "skipping match: {reason}");
                    tally.skipped += 1;
                }
            }
        }
        tally.skipped += total - finished;
        debug!(player_id, total, finished, "page batch done");
        Ok(())
    }
}

/// Decide how the history walk ended: `Ok(true)` when it was cut short by a
/// failure after matches were retrieved, an error when nothing was.
fn history_outcome(pager: &mut HistoryPager<'_>) -> Result<bool, PipelineError> {
    match pager.take_failure() {
        Some(source) if pager.yielded() == 0 => Err(PipelineError::Unreachable { source }),
        Some(_) => {
            warn!(
                retrieved = pager.yielded(),
                "history truncated by upstream failure"
            );
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_settings_match_upstream_limits() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.max_matches, 100);
        assert_eq!(settings.concurrency, 20);
        assert_eq!(settings.batch_timeout, None);
        assert_eq!(settings.league_marker, "ESEA");
        assert!(!settings.count_unclassified);
    }

    #[test]
    fn span_tracks_earliest_and_latest() {
        let t = |secs| Utc.timestamp_opt(secs, 0).single();
        let mut span = None;
        MatchSpan::include(&mut span, None);
        assert_eq!(span, None);

        MatchSpan::include(&mut span, t(200));
        MatchSpan::include(&mut span, t(100));
        MatchSpan::include(&mut span, None);
        MatchSpan::include(&mut span, t(300));
        let span = span.unwrap();
        assert_eq!(span.first.timestamp(), 100);
        assert_eq!(span.last.timestamp(), 300);
    }
}
