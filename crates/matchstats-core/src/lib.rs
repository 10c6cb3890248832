// Match-statistics aggregation: paginated history retrieval, concurrent
// per-match extraction, classification, and averaging over a statistics API.

pub mod aggregate;
pub mod api;
pub mod classify;
pub mod config;
pub mod extract;
pub mod history;
pub mod lookup;
pub mod pipeline;
pub mod schema;
pub mod team;

pub use aggregate::{AggregateError, Aggregator, AveragedStatRecord, GroupKey, StatRecord};
pub use api::{ApiError, HttpSender, RequestSender, StatsApi};
pub use classify::{Classification, LeagueKey, LeagueMatch, MatchClassifier};
pub use history::{CompetitionType, HistoryPager, MatchSummary};
pub use pipeline::{
    LeagueReport, LeagueSeason, MatchSpan, PipelineError, PipelineSettings, StatsPipeline,
    StatsReport,
};
pub use schema::{SchemaMode, StatField, StatSchema};
