//! End-to-end tests for the diagnostic commands against a file-backed store.

use clap::Parser;
use listsync_app::cli::{execute, Cli, Command};
use listsync_app::config::{Config, FALLBACK_APP_ID};
use listsync_app::storage_from_config;
use listsync_storage::AsyncStorage;
use serde_json::Value;

fn config_in(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.database.path = dir
        .path()
        .join("cli.db")
        .to_str()
        .expect("utf-8 path")
        .to_string();
    config
}

fn command(list: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("listsync").chain(list.iter().copied()))
        .expect("should parse")
        .command
}

#[tokio::test]
async fn set_get_rm_round_trip() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = config_in(&dir);
    let storage = storage_from_config(&config);

    let out = execute(&command(&["set", "greeting", "hello"]), &storage, FALLBACK_APP_ID)
        .await
        .expect("set should succeed");
    assert!(out.is_empty());

    let out = execute(&command(&["get", "greeting"]), &storage, FALLBACK_APP_ID)
        .await
        .expect("get should succeed");
    assert_eq!(out, "hello");

    execute(&command(&["rm", "greeting"]), &storage, FALLBACK_APP_ID)
        .await
        .expect("rm should succeed");
    assert_eq!(storage.get_item("greeting").await.expect("get_item"), None);
}

#[tokio::test]
async fn keys_are_listed_sorted() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let storage = storage_from_config(&config_in(&dir));
    storage.set_item("b", "2").await.expect("set b");
    storage.set_item("a", "1").await.expect("set a");

    let out = execute(&Command::Keys, &storage, FALLBACK_APP_ID)
        .await
        .expect("keys should succeed");
    assert_eq!(out, "a\nb");

    execute(&Command::Clear, &storage, FALLBACK_APP_ID)
        .await
        .expect("clear should succeed");
    let out = execute(&Command::Keys, &storage, FALLBACK_APP_ID)
        .await
        .expect("keys should succeed");
    assert!(out.is_empty());
}

#[tokio::test]
async fn stats_reports_backend_counters_and_footprint() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let mut config = config_in(&dir);
    config.sync.app_id = Some("test-app".to_string());
    let storage = storage_from_config(&config);
    storage.set_item("a", "1").await.expect("set a");

    let out = execute(&Command::Stats, &storage, config.resolve_app_id())
        .await
        .expect("stats should succeed");
    let report: Value = serde_json::from_str(&out).expect("stats output should be JSON");

    assert_eq!(report["backend"], "sqlite-async-shim");
    assert_eq!(report["appId"], "test-app");
    assert_eq!(report["stats"]["setItem"], 1);
    assert_eq!(report["footprint"]["keyCount"], 1);
    assert!(report["dbPath"].as_str().is_some_and(|p| p.ends_with("cli.db")));
}
