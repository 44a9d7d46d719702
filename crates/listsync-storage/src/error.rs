//! Error types for the key-value storage layer.

use std::sync::Arc;

use listsync_db::{PoolError, SchemaError};

/// Errors raised while opening the database and preparing the `kv` table.
///
/// Initialization runs once per engine. Its outcome is cached, so a failure
/// is shared (behind an `Arc`) with every operation issued afterwards.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The connection pool could not be built.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// No connection could be checked out to run the schema bootstrap.
    #[error("failed to check out bootstrap connection: {0}")]
    Checkout(#[from] r2d2::Error),

    /// The `kv` table could not be created.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The blocking task running the opener panicked or was cancelled.
    #[error("storage initialization task failed: {0}")]
    Task(String),
}

/// Errors returned by storage operations.
///
/// A missing key is not an error; lookups resolve to `None`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Initialization failed earlier; the store stays unavailable until the
    /// process restarts.
    #[error("storage unavailable: {0}")]
    Init(#[source] Arc<InitError>),

    /// A pooled connection could not be checked out.
    #[error("storage connection checkout failed: {0}")]
    Checkout(#[from] r2d2::Error),

    /// A SQL statement failed (constraint violation, I/O error, disk full).
    #[error("storage statement failed: {0}")]
    Statement(#[from] rusqlite::Error),

    /// The blocking task running the statement panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StorageError {
    /// Returns the cached initialization error, if this is one.
    pub fn init_error(&self) -> Option<&Arc<InitError>> {
        match self {
            StorageError::Init(err) => Some(err),
            _ => None,
        }
    }
}
