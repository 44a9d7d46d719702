//! listsync client support library.
//!
//! Configuration, logging setup and the diagnostic command line for the
//! local store that backs the sync client.

pub mod cli;
pub mod config;
pub mod logging;

use listsync_storage::SqliteStorage;

/// Builds the storage adapter described by `config`.
///
/// The database is not opened until the first operation.
pub fn storage_from_config(config: &config::Config) -> SqliteStorage {
    SqliteStorage::open(&config.database.path, config.database.runtime_settings())
}
