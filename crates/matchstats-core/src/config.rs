// Configuration loading and parsing (matchstats.toml, credentials.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::classify::DEFAULT_LEAGUE_MARKER;
use crate::history::MAX_PAGE_SIZE;
use crate::pipeline::PipelineSettings;

/// Environment variable that overrides `credentials.toml`.
pub const API_KEY_ENV: &str = "MATCHSTATS_API_KEY";

/// Templates written into `config/` on first run.
const DEFAULT_FILES: &[(&str, &str)] = &[
    ("matchstats.toml", include_str!("../defaults/matchstats.toml")),
    (
        "credentials.toml.example",
        include_str!("../defaults/credentials.toml.example"),
    ),
];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub pipeline: PipelineConfig,
    pub league: LeagueConfig,
    pub team: TeamConfig,
    pub credentials: CredentialsConfig,
}

impl Config {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            page_size: self.pipeline.page_size,
            max_matches: self.pipeline.max_matches,
            concurrency: self.pipeline.concurrency,
            batch_timeout: match self.pipeline.batch_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            league_marker: self.league.marker.clone(),
            count_unclassified: self.league.count_unclassified,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn roster_timeout(&self) -> Duration {
        Duration::from_secs(self.team.roster_timeout_secs)
    }

    /// Replace the credentials-file key with `key` when it is non-empty.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.credentials.api_key = Some(key);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// matchstats.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire matchstats.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SettingsFile {
    api: ApiConfig,
    pipeline: PipelineConfig,
    #[serde(default)]
    league: LeagueConfig,
    #[serde(default)]
    team: TeamConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub game: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Zero disables the batch deadline.
    #[serde(default)]
    pub batch_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default)]
    pub count_unclassified: bool,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            count_unclassified: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamConfig {
    #[serde(default = "default_roster_timeout_secs")]
    pub roster_timeout_secs: u64,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            roster_timeout_secs: default_roster_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_max_matches() -> usize {
    100
}

fn default_concurrency() -> usize {
    20
}

fn default_marker() -> String {
    DEFAULT_LEAGUE_MARKER.to_owned()
}

fn default_roster_timeout_secs() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/matchstats.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// Does not write defaults or consult the environment; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- matchstats.toml (required) ---
    let settings_path = config_dir.join("matchstats.toml");
    let settings_text = read_file(&settings_path)?;
    let settings: SettingsFile =
        toml::from_str(&settings_text).map_err(|e| ConfigError::ParseError {
            path: settings_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        api: settings.api,
        pipeline: settings.pipeline,
        league: settings.league,
        team: settings.team,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Write any missing default files into `base_dir/config/`. Existing files
/// are never overwritten. Returns the files that were written.
///
/// The credentials template keeps its `.example` suffix so it is never
/// picked up as live credentials.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut written = Vec::new();
    for (file_name, content) in DEFAULT_FILES {
        let target = config_dir.join(file_name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                std::io::Write::write_all(&mut dest, content.as_bytes()).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                written.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(written)
}

/// Write missing defaults, load `base_dir`'s config, and apply the
/// `MATCHSTATS_API_KEY` override.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    let config = load_config_from(base_dir)?;
    Ok(config.with_api_key_override(std::env::var(API_KEY_ENV).ok()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: format!("must be an http(s) URL, got `{base_url}`"),
        });
    }

    if config.api.game.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "api.game".into(),
            message: "must not be empty".into(),
        });
    }

    let page_size = config.pipeline.page_size;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ConfigError::ValidationError {
            field: "pipeline.page_size".into(),
            message: format!("must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"),
        });
    }

    let positive: &[(&str, u64)] = &[
        ("api.request_timeout_secs", config.api.request_timeout_secs),
        ("pipeline.max_matches", config.pipeline.max_matches as u64),
        ("pipeline.concurrency", config.pipeline.concurrency as u64),
        ("team.roster_timeout_secs", config.team.roster_timeout_secs),
    ];
    for (name, val) in positive {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if config.league.marker.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.marker".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Fresh temp tree with the default files written into `config/`.
    fn default_tree(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        ensure_config_files(&tmp).expect("should write default configs");
        tmp
    }

    /// Rewrite one `key = value` line of the tree's matchstats.toml.
    fn set_value(tmp: &Path, key: &str, value: &str) {
        let path = tmp.join("config/matchstats.toml");
        let text = fs::read_to_string(&path).unwrap();
        let replaced: Vec<String> = text
            .lines()
            .map(|line| {
                if line.starts_with(&format!("{key} =")) {
                    format!("{key} = {value}")
                } else {
                    line.to_owned()
                }
            })
            .collect();
        fs::write(&path, replaced.join("\n")).unwrap();
    }

    fn expect_validation_field(tmp: &Path, expected: &str) {
        let err = load_config_from(tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other:?}"),
        }
    }

    #[test]
    fn load_valid_config_from_defaults() {
        let tmp = default_tree("matchstats_config_defaults");
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.api.base_url, "https://open.faceit.com/data/v4");
        assert_eq!(config.api.game, "cs2");
        assert_eq!(config.api.request_timeout_secs, 15);
        assert_eq!(config.pipeline.page_size, 100);
        assert_eq!(config.pipeline.max_matches, 100);
        assert_eq!(config.pipeline.concurrency, 20);
        assert_eq!(config.pipeline.batch_timeout_secs, 0);
        assert_eq!(config.league.marker, "ESEA");
        assert!(!config.league.count_unclassified);
        assert_eq!(config.team.roster_timeout_secs, 10);
        assert!(config.credentials.api_key.is_none());

        let settings = config.pipeline_settings();
        assert_eq!(settings, PipelineSettings::default());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_never_overwrites() {
        let tmp = default_tree("matchstats_config_no_overwrite");
        let path = tmp.join("config/matchstats.toml");
        set_value(&tmp, "concurrency", "7");

        let written = ensure_config_files(&tmp).unwrap();
        assert!(written.is_empty());
        assert!(fs::read_to_string(&path).unwrap().contains("concurrency = 7"));
        assert!(tmp.join("config/credentials.toml.example").exists());
        assert!(!tmp.join("config/credentials.toml").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_settings_file_is_reported() {
        let tmp = std::env::temp_dir().join("matchstats_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with("config/matchstats.toml"))
            }
            other => panic!("expected FileNotFound, got: {other:?}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn credentials_toml_with_api_key() {
        let tmp = default_tree("matchstats_config_with_creds");
        fs::write(
            tmp.join("config/credentials.toml"),
            "api_key = \"test-key\"\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load with credentials.toml");
        assert_eq!(config.credentials.api_key.as_deref(), Some("test-key"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn env_key_overrides_credentials_file() {
        let tmp = default_tree("matchstats_config_env_override");
        fs::write(tmp.join("config/credentials.toml"), "api_key = \"file-key\"\n").unwrap();
        let config = load_config_from(&tmp).unwrap();

        let overridden = config.clone().with_api_key_override(Some("env-key".into()));
        assert_eq!(overridden.credentials.api_key.as_deref(), Some("env-key"));

        let blank = config.clone().with_api_key_override(Some("  ".into()));
        assert_eq!(blank.credentials.api_key.as_deref(), Some("file-key"));

        let unset = config.with_api_key_override(None);
        assert_eq!(unset.credentials.api_key.as_deref(), Some("file-key"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn batch_timeout_maps_to_optional_duration() {
        let tmp = default_tree("matchstats_config_batch_timeout");
        set_value(&tmp, "batch_timeout_secs", "30");
        set_value(&tmp, "count_unclassified", "true");
        let settings = load_config_from(&tmp).unwrap().pipeline_settings();
        assert_eq!(settings.batch_timeout, Some(Duration::from_secs(30)));
        assert!(settings.count_unclassified);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let tmp = std::env::temp_dir().join("matchstats_config_minimal");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(
            tmp.join("config/matchstats.toml"),
            "[api]\nbase_url = \"http://localhost:9000\"\ngame = \"csgo\"\n\n[pipeline]\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.api.game, "csgo");
        assert_eq!(config.pipeline.page_size, 100);
        assert_eq!(config.league.marker, "ESEA");
        assert_eq!(config.roster_timeout(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(15));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_names_the_file() {
        let tmp = default_tree("matchstats_config_parse_error");
        fs::write(tmp.join("config/matchstats.toml"), "[api\nbase_url = ").unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => {
                assert!(path.ends_with("config/matchstats.toml"))
            }
            other => panic!("expected ParseError, got: {other:?}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_page_size_above_upstream_limit() {
        let tmp = default_tree("matchstats_config_page_size");
        set_value(&tmp, "page_size", "101");
        expect_validation_field(&tmp, "pipeline.page_size");
        set_value(&tmp, "page_size", "0");
        expect_validation_field(&tmp, "pipeline.page_size");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let tmp = default_tree("matchstats_config_concurrency");
        set_value(&tmp, "concurrency", "0");
        expect_validation_field(&tmp, "pipeline.concurrency");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let tmp = default_tree("matchstats_config_base_url");
        set_value(&tmp, "base_url", "\"ftp://example.test\"");
        expect_validation_field(&tmp, "api.base_url");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_league_marker() {
        let tmp = default_tree("matchstats_config_marker");
        set_value(&tmp, "marker", "\"\"");
        expect_validation_field(&tmp, "league.marker");
        let _ = fs::remove_dir_all(&tmp);
    }
}
