//! Client configuration loading from file and environment variables.

use listsync_db::{DbRuntimeSettings, DEFAULT_DB_NAME};
use serde::Deserialize;
use thiserror::Error;

/// Sync service application identifier used when none is configured.
pub const FALLBACK_APP_ID: &str = "1be71d54-11aa-4705-a2b1-e96753009db4";

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Sync service settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Local store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sync service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    /// Application identifier registered with the sync service.
    #[serde(default)]
    pub app_id: Option<String>,
}

/// Local store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// How long an operation waits for the shared connection, in
    /// milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "listsync_storage=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_db_path() -> String {
    DEFAULT_DB_NAME.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DbRuntimeSettings::default().busy_timeout_ms
}

fn default_connection_timeout_ms() -> u64 {
    DbRuntimeSettings::default().connection_timeout_ms
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// Pool settings for the local store. The pool always holds a single
    /// connection.
    pub fn runtime_settings(&self) -> DbRuntimeSettings {
        DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            connection_timeout_ms: self.connection_timeout_ms,
            ..DbRuntimeSettings::default()
        }
    }
}

impl Config {
    /// The sync application identifier, or [`FALLBACK_APP_ID`] when unset
    /// or blank.
    pub fn resolve_app_id(&self) -> &str {
        self.sync
            .app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(FALLBACK_APP_ID)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `LISTSYNC_APP_ID` overrides `sync.app_id`
/// - `LISTSYNC_DB_PATH` overrides `database.path`
/// - `LISTSYNC_LOG_LEVEL` overrides `logging.level`
/// - `LISTSYNC_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    Ok(apply_env_overrides(config, |name| std::env::var(name).ok()))
}

fn apply_env_overrides(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(app_id) = var("LISTSYNC_APP_ID") {
        config.sync.app_id = Some(app_id);
    }
    if let Some(db_path) = var("LISTSYNC_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("LISTSYNC_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("LISTSYNC_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    config
}
