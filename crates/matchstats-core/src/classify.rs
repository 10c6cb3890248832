// Match classification: matchmaking vs tracked-league championship, and
// season/division metadata parsed from league competition names.

use regex::Regex;
use serde::Serialize;

use crate::history::{CompetitionType, MatchSummary};

pub const DEFAULT_LEAGUE_MARKER: &str = "ESEA";

/// Season/division metadata for one league match.
///
/// Parsed from names shaped like `ESEA S51 NA PREMIER DIV1 - Week 3`; the three
/// tokens after the season are kept in the order they were captured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LeagueKey {
    /// Season label, e.g. "S51".
    pub season: String,
    /// Numeric part of the season label, used for ordering.
    pub season_number: u32,
    pub location: String,
    pub division: String,
    pub division_location: String,
    /// Free text after the dash, trimmed (e.g. "Week 3", "Playoffs").
    pub game_type: String,
}

impl LeagueKey {
    /// Group key used to bucket league matches: season, division, location.
    pub fn group_key(&self) -> String {
        format!("{}-{}-{}", self.season, self.division, self.location)
    }
}

/// Outcome for a championship match that carries the league marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeagueMatch {
    Classified(LeagueKey),
    /// The name carried the marker but did not fit the expected shape.
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Matchmaking,
    Championship(LeagueMatch),
    Other,
}

/// Pure classifier for match summaries. Build once per run and share.
#[derive(Debug, Clone)]
pub struct MatchClassifier {
    marker: String,
    pattern: Regex,
}

impl MatchClassifier {
    /// `marker` identifies the tracked league inside competition names and is
    /// matched case-insensitively.
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        let source = format!(
            r"(?i){}\s+S(\d+)\s+(\w+)\s+(\w+)\s+(\w+)\s*-\s*(.+)",
            regex::escape(marker)
        );
        Ok(Self {
            marker: marker.to_lowercase(),
            pattern: Regex::new(&source)?,
        })
    }

    pub fn classify(&self, summary: &MatchSummary) -> Classification {
        match summary.competition_type {
            CompetitionType::Matchmaking => Classification::Matchmaking,
            CompetitionType::Championship if self.carries_marker(&summary.competition_name) => {
                match self.parse_league_name(&summary.competition_name) {
                    Some(key) => Classification::Championship(LeagueMatch::Classified(key)),
                    None => Classification::Championship(LeagueMatch::Unclassified),
                }
            }
            _ => Classification::Other,
        }
    }

    /// Parse a competition name into league metadata; `None` when the name
    /// does not follow `<marker> S<digits> <token> <token> <token> - <text>`.
    pub fn parse_league_name(&self, name: &str) -> Option<LeagueKey> {
        let caps = self.pattern.captures(name)?;
        let digits = caps.get(1)?.as_str();
        let game_type = caps.get(5)?.as_str().trim();
        if game_type.is_empty() {
            return None;
        }
        Some(LeagueKey {
            season: format!("S{digits}"),
            season_number: digits.parse().unwrap_or(0),
            location: caps.get(2)?.as_str().to_owned(),
            division: caps.get(3)?.as_str().to_owned(),
            division_location: caps.get(4)?.as_str().to_owned(),
            game_type: game_type.to_owned(),
        })
    }

    fn carries_marker(&self, name: &str) -> bool {
        !self.marker.is_empty() && name.to_lowercase().contains(&self.marker)
    }
}
