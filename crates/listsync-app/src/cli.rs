//! Diagnostic command line over the local key-value store.

use clap::{Parser, Subcommand};
use listsync_storage::{AsyncStorage, SqliteStorage, StorageError};
use serde_json::json;
use thiserror::Error;

/// Inspect and edit the local listsync key-value store
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "listsync")]
#[command(about = "Inspect and edit the local listsync key-value store")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "LISTSYNC_CONFIG_PATH", global = true)]
    pub config: Option<String>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Store commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the stored value
    Get { key: String },

    /// Store a value
    Set { key: String, value: String },

    /// Remove one or more keys
    #[command(name = "rm")]
    Remove {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// List stored keys
    Keys,

    /// Remove every key
    Clear,

    /// Print backend, counters and footprint as JSON
    Stats,
}

/// Errors from executing a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The store rejected the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Output could not be encoded.
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runs `command` against `storage` and returns the text to print.
///
/// # Errors
///
/// Returns `CliError::Storage` if the store fails.
pub async fn execute(
    command: &Command,
    storage: &SqliteStorage,
    app_id: &str,
) -> Result<String, CliError> {
    let output = match command {
        Command::Get { key } => storage.get_item(key).await?.unwrap_or_default(),
        Command::Set { key, value } => {
            storage.set_item(key, value).await?;
            String::new()
        }
        Command::Remove { keys } => {
            storage.multi_remove(keys).await?;
            String::new()
        }
        Command::Keys => {
            let mut keys = storage.get_all_keys().await?;
            keys.sort();
            keys.join("\n")
        }
        Command::Clear => {
            storage.clear().await?;
            String::new()
        }
        Command::Stats => {
            let footprint = storage.engine().footprint().await?;
            let report = json!({
                "backend": storage.backend(),
                "appId": app_id,
                "dbPath": storage.engine().db_path().map(|p| p.display().to_string()),
                "footprint": footprint,
                "stats": storage.get_stats(),
            });
            serde_json::to_string_pretty(&report)?
        }
    };
    Ok(output)
}
