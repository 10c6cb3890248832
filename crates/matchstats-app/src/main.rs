// matchstats entry point.
//
// Startup sequence:
// 1. Parse the command line
// 2. Initialize tracing (log to file, not terminal)
// 3. Load config, writing defaults on first run
// 4. Build the HTTP sender and API client
// 5. Run the requested command and render its report to stdout

mod cli;
mod output;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use directories::ProjectDirs;
use tracing::{info, warn};

use matchstats_core::config::{self, API_KEY_ENV};
use matchstats_core::lookup::{player_profile, resolve_player, resolve_team, PlayerProfile, PlayerRef};
use matchstats_core::team::team_overview;
use matchstats_core::{HttpSender, SchemaMode, StatsApi, StatsPipeline};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse the command line
    let cli = Cli::parse();

    // 2. Initialize tracing (log to file, not terminal)
    let dirs = ProjectDirs::from("", "", "matchstats");
    let log_path = init_tracing(dirs.as_ref())?;
    info!("matchstats starting up, logging to {}", log_path.display());

    // 3. Load config
    let base_dir = config_base_dir(cli.config_dir.as_deref(), dirs.as_ref())?;
    let config = config::load_config(&base_dir)
        .with_context(|| format!("failed to load configuration from {}", base_dir.display()))?;
    info!(
        "Config loaded: base_url={}, game={}, page_size={}, concurrency={}",
        config.api.base_url, config.api.game, config.pipeline.page_size, config.pipeline.concurrency
    );

    // 4. Build the API client
    let api_key = config.credentials.api_key.clone().with_context(|| {
        format!(
            "no API key configured: set {API_KEY_ENV} or add api_key to {}",
            base_dir.join("config/credentials.toml").display()
        )
    })?;
    let sender = HttpSender::new(api_key, config.request_timeout())
        .context("failed to initialize the HTTP client")?;
    let api = StatsApi::new(Arc::new(sender), &config.api.base_url, &config.api.game);

    // 5. Run the command
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Stats {
            player,
            full,
            limit,
            id,
        } => {
            let (player, profile) = player_ref(&api, &player, id).await?;
            let mut settings = config.pipeline_settings();
            if let Some(limit) = limit {
                settings.max_matches = limit;
            }
            let pipeline = StatsPipeline::new(api, settings).context("invalid pipeline settings")?;
            let report = pipeline
                .run_stats(&player.player_id, schema_mode(full).schema())
                .await
                .with_context(|| format!("stats run failed for {}", player.nickname))?;
            output::render_stats(&mut out, cli.format, &player, profile.as_ref(), &report)?;
        }
        Commands::League { player, full, id } => {
            let (player, profile) = player_ref(&api, &player, id).await?;
            let pipeline = StatsPipeline::new(api, config.pipeline_settings())
                .context("invalid pipeline settings")?;
            let report = pipeline
                .run_league(&player.player_id, schema_mode(full).schema())
                .await
                .with_context(|| format!("league run failed for {}", player.nickname))?;
            output::render_league(&mut out, cli.format, &player, profile.as_ref(), &report)?;
        }
        Commands::Team { team } => {
            let team_id = resolve_team(&api, &team)
                .await
                .with_context(|| format!("could not resolve team `{team}`"))?;
            let overview = team_overview(&api, &team_id, config.roster_timeout())
                .await
                .with_context(|| format!("failed to load team {team_id}"))?;
            output::render_team(&mut out, cli.format, &overview)?;
        }
    }
    out.flush().context("failed to flush stdout")?;

    info!("matchstats finished");
    Ok(())
}

fn schema_mode(full: bool) -> SchemaMode {
    if full {
        SchemaMode::Full
    } else {
        SchemaMode::Basic
    }
}

/// Use `input` verbatim as an id, or resolve it as a nickname, then load the
/// profile shown in the report header. A missing profile is not fatal.
async fn player_ref(
    api: &StatsApi,
    input: &str,
    is_id: bool,
) -> anyhow::Result<(PlayerRef, Option<PlayerProfile>)> {
    let mut player = if is_id {
        PlayerRef {
            player_id: input.to_owned(),
            nickname: input.to_owned(),
        }
    } else {
        let player = resolve_player(api, input)
            .await
            .with_context(|| format!("could not resolve player `{input}`"))?;
        info!("Resolved {} to {}", input, player.player_id);
        player
    };

    let profile = match player_profile(api, &player.player_id).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!("profile lookup failed for {}: {e}", player.player_id);
            return Ok((player, None));
        }
    };
    if is_id && !profile.nickname.is_empty() {
        player.nickname = profile.nickname.clone();
    }
    Ok((player, Some(profile)))
}

/// `--config-dir` if given, else the platform config directory, else the
/// working directory.
fn config_base_dir(explicit: Option<&Path>, dirs: Option<&ProjectDirs>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    match dirs {
        Some(dirs) => Ok(dirs.config_dir().to_path_buf()),
        None => std::env::current_dir().context("failed to determine working directory"),
    }
}

/// Log to a file under the platform data directory (or `./logs`), never to
/// the terminal. Returns the log file path.
fn init_tracing(dirs: Option<&ProjectDirs>) -> anyhow::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = match dirs {
        Some(dirs) => dirs.data_dir().join("logs"),
        None => std::env::current_dir()?.join("logs"),
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join("matchstats.log");
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("matchstats=info,matchstats_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(log_path)
}
