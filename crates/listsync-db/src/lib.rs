//! SQLite plumbing for the listsync local store.
//!
//! Provides the connection pool (via `r2d2`) and the bootstrap of the single
//! `kv` table that backs the key-value persistence layer.
//!
//! # Design decisions
//!
//! - **One physical connection**: the pool defaults to a maximum size of one,
//!   so every caller shares the same connection to the database file. The
//!   pool is the checkout point, not a source of parallelism.
//! - **WAL mode**: readers do not block on the writer across processes that
//!   inspect the file (e.g. the diagnostic CLI while the app is running).
//! - **No bookkeeping tables**: the schema is a single idempotent
//!   `CREATE TABLE IF NOT EXISTS`, so the store owns exactly one table.

mod pool;
mod schema;

pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use schema::{migrate, SchemaError, DEFAULT_DB_NAME, KV_TABLE_SQL};
