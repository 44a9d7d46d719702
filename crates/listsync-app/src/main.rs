//! listsync binary: inspect and edit the local key-value store.

use clap::Parser;
use listsync_app::cli::{self, Cli};
use listsync_app::{config, logging, storage_from_config};

const DEFAULT_CONFIG_PATH: &str = "listsync.toml";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match config::load_config(Some(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    logging::init_tracing(&config.logging);

    let app_id = config.resolve_app_id();
    tracing::info!(
        path = %config_path,
        app_id,
        db_path = %config.database.path,
        "resolved configuration"
    );

    let storage = storage_from_config(&config);

    match cli::execute(&cli.command, &storage, app_id).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
