use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table
    Table,
    /// Pretty-printed JSON document
    Json,
    /// One CSV row per group
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "matchstats")]
#[command(about = "Average per-match statistics over a player's or team's match history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding `config/` (defaults to the platform config directory)
    #[arg(long, global = true, env = "MATCHSTATS_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Average a player's recent matchmaking matches
    Stats {
        /// Player nickname, or player id with --id
        player: String,

        /// Use the full stat set instead of the basic one
        #[arg(long)]
        full: bool,

        /// Number of recent matches to consider (1-300)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Treat PLAYER as a player id
        #[arg(long)]
        id: bool,
    },

    /// Average a player's league matches per season and division
    League {
        /// Player nickname, or player id with --id
        player: String,

        /// Use the full stat set instead of the basic one
        #[arg(long)]
        full: bool,

        /// Treat PLAYER as a player id
        #[arg(long)]
        id: bool,
    },

    /// Show a team's roster, lifetime record and map records
    Team {
        /// Exact team name (case sensitive) or team page URL
        team: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_stats_with_flags() {
        let cli = Cli::parse_from(["matchstats", "--format", "json", "stats", "alice", "--full", "-l", "50"]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Stats { player, full, limit, id } => {
                assert_eq!(player, "alice");
                assert!(full);
                assert_eq!(limit, Some(50));
                assert!(!id);
            }
            other => panic!("expected stats command, got {other:?}"),
        }
    }

    #[test]
    fn format_defaults_to_table_and_is_global() {
        let cli = Cli::parse_from(["matchstats", "team", "Foxes"]);
        assert_eq!(cli.format, OutputFormat::Table);

        let cli = Cli::parse_from(["matchstats", "league", "p-1", "--id", "--format", "csv"]);
        assert_eq!(cli.format, OutputFormat::Csv);
        assert!(matches!(cli.command, Commands::League { id: true, .. }));
    }
}
