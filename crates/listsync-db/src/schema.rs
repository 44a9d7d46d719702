//! Schema bootstrap for the key-value table.
//!
//! The store owns exactly one table. Creating it is idempotent, so the
//! bootstrap runs on every open without tracking applied versions.

use rusqlite::Connection;
use thiserror::Error;

/// File name used when no database path is configured.
pub const DEFAULT_DB_NAME: &str = "listsync_kv.db";

/// DDL for the key-value table.
pub const KV_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY NOT NULL, value TEXT)";

/// Errors that can occur while preparing the schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The table creation statement failed.
    #[error("failed to create kv table: {0}")]
    CreateTable(#[source] rusqlite::Error),
}

/// Creates the `kv` table if it does not exist yet.
///
/// # Errors
///
/// Returns `SchemaError::CreateTable` if the statement or its surrounding
/// transaction fails.
pub fn migrate(conn: &Connection) -> Result<(), SchemaError> {
    let tx = conn
        .unchecked_transaction()
        .map_err(SchemaError::CreateTable)?;
    tx.execute_batch(KV_TABLE_SQL)
        .map_err(SchemaError::CreateTable)?;
    tx.commit().map_err(SchemaError::CreateTable)?;

    tracing::debug!("kv table ready");
    Ok(())
}
