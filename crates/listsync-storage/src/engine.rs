//! SQLite-backed key-value engine.
//!
//! [`KvEngine`] owns the lazily opened connection pool and the per-instance
//! invocation counters. The first operation runs the opener (pool creation
//! plus the `kv` table bootstrap) on a blocking thread; concurrent first
//! callers block on that same initialization, and its outcome, success or
//! failure, is kept for the lifetime of the engine. The initialization
//! completes even if the caller that started it is cancelled.
//!
//! Every statement runs under `spawn_blocking` on a pooled connection.
//! Batch writes run inside a single `IMMEDIATE` transaction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use listsync_db::{create_pool, migrate, DbPool, DbRuntimeSettings};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::error::{InitError, StorageError};
use crate::stats::{Operation, StatsCounters, StorageStats};

/// Upper bound on bound parameters per IN-list statement.
///
/// Larger batches are split into several statements inside one transaction.
pub const MAX_KEYS_PER_STATEMENT: usize = 500;

const UPSERT_SQL: &str = "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)";

type Opener = dyn Fn() -> Result<DbPool, InitError> + Send + Sync;

/// A decoded row of the `kv` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvRow {
    pub key: String,
    pub value: Option<String>,
}

impl KvRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            value: row.get(1)?,
        })
    }
}

/// Size of the store on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageFootprint {
    /// Number of records in the `kv` table.
    pub key_count: u64,
    /// Size of the database file plus its `-wal` file, or `None` for
    /// in-memory stores and engines built from a custom opener.
    pub db_bytes: Option<u64>,
}

/// Opens a pool over `db_path` and creates the `kv` table if absent.
///
/// This is the opener used by [`KvEngine::open_lazy`]; custom openers can
/// wrap it.
///
/// # Errors
///
/// Returns `InitError` if the pool cannot be built, a connection cannot be
/// checked out, or the table cannot be created.
pub fn open_kv_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, InitError> {
    let pool = create_pool(db_path, settings)?;
    {
        let conn = pool.get()?;
        migrate(&conn)?;
    }
    Ok(pool)
}

/// Runs the opener once, turning a panic into a cached `InitError::Task`.
fn initialize(opener: &Opener, db_path: Option<&Path>) -> Result<DbPool, Arc<InitError>> {
    let result = catch_unwind(AssertUnwindSafe(opener)).unwrap_or_else(|panic| {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "opener panicked".to_string());
        Err(InitError::Task(message))
    });

    match result {
        Ok(pool) => {
            tracing::info!(path = ?db_path, "kv storage initialized");
            Ok(pool)
        }
        Err(e) => {
            tracing::error!(path = ?db_path, error = %e, "kv storage initialization failed");
            Err(Arc::new(e))
        }
    }
}

/// Durable string-keyed storage over a single SQLite table.
pub struct KvEngine {
    opener: Arc<Opener>,
    pool: Arc<OnceLock<Result<DbPool, Arc<InitError>>>>,
    db_path: Option<PathBuf>,
    counters: StatsCounters,
}

impl std::fmt::Debug for KvEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvEngine")
            .field("db_path", &self.db_path)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl KvEngine {
    /// Creates an engine for the database file at `path`.
    ///
    /// Nothing is opened until the first operation.
    pub fn open_lazy(path: impl Into<PathBuf>, settings: DbRuntimeSettings) -> Self {
        let path = path.into();
        let path_str = path.to_string_lossy().into_owned();
        let db_path = (path_str != ":memory:").then(|| path.clone());

        let mut engine = Self::with_opener(move || open_kv_pool(&path_str, settings));
        engine.db_path = db_path;
        engine
    }

    /// Creates an engine over a private in-memory database.
    pub fn in_memory() -> Self {
        Self::open_lazy(":memory:", DbRuntimeSettings::default())
    }

    /// Creates an engine whose first operation runs `opener`.
    ///
    /// The opener must return a pool whose connections already see the
    /// `kv` table. It runs at most once per engine.
    pub fn with_opener<F>(opener: F) -> Self
    where
        F: Fn() -> Result<DbPool, InitError> + Send + Sync + 'static,
    {
        Self {
            opener: Arc::new(opener),
            pool: Arc::new(OnceLock::new()),
            db_path: None,
            counters: StatsCounters::default(),
        }
    }

    /// Path of the database file, if this engine is file-backed.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Whether initialization has completed successfully.
    pub fn is_initialized(&self) -> bool {
        matches!(self.pool.get(), Some(Ok(_)))
    }

    /// Invocation counts since this engine was created.
    pub fn stats(&self) -> StorageStats {
        self.counters.snapshot()
    }

    async fn pool(&self) -> Result<DbPool, StorageError> {
        let outcome = match self.pool.get() {
            Some(outcome) => outcome.clone(),
            None => {
                // The cell is filled on the blocking thread, so dropping this
                // future never abandons an initialization halfway.
                let cell = Arc::clone(&self.pool);
                let opener = Arc::clone(&self.opener);
                let db_path = self.db_path.clone();
                tokio::task::spawn_blocking(move || {
                    cell.get_or_init(|| initialize(&*opener, db_path.as_deref()))
                        .clone()
                })
                .await?
            }
        };
        outcome.map_err(StorageError::Init)
    }

    async fn run<T, F>(&self, op: Operation, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool().await?;
        let result = tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = pool.get()?;
            Ok(f(&mut *conn)?)
        })
        .await
        .map_err(StorageError::from)
        .and_then(|inner| inner);

        if let Err(ref e) = result {
            tracing::warn!(op = op.as_str(), error = %e, "kv statement failed");
        }
        result
    }

    /// Looks up one value. A missing key resolves to `None`.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.counters.record(Operation::GetItem);
        self.select_value(Operation::GetItem, key).await
    }

    /// Reads a value without touching the invocation counters.
    pub async fn peek(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.select_value(Operation::GetItem, key).await
    }

    async fn select_value(&self, op: Operation, key: &str) -> Result<Option<String>, StorageError> {
        let key = key.to_owned();
        self.run(op, move |conn| {
            let row = conn
                .query_row(
                    "SELECT key, value FROM kv WHERE key = ?1",
                    [&key],
                    KvRow::from_row,
                )
                .optional()?;
            Ok(row.and_then(|r| r.value))
        })
        .await
    }

    /// Inserts or replaces one record.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.counters.record(Operation::SetItem);
        let (key, value) = (key.to_owned(), value.to_owned());
        self.run(Operation::SetItem, move |conn| {
            conn.execute(UPSERT_SQL, params![key, value])?;
            Ok(())
        })
        .await
    }

    /// Deletes one record. Removing an absent key is a no-op.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.counters.record(Operation::RemoveItem);
        let key = key.to_owned();
        self.run(Operation::RemoveItem, move |conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", [&key])?;
            Ok(())
        })
        .await
    }

    /// Every stored key.
    ///
    /// The order is whatever SQLite returns and must not be relied upon.
    pub async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        self.counters.record(Operation::GetAllKeys);
        self.run(Operation::GetAllKeys, |conn| {
            let mut stmt = conn.prepare("SELECT key FROM kv")?;
            let keys = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(keys)
        })
        .await
    }

    /// Looks up many keys at once.
    ///
    /// The result has one pair per input key, in input order, with `None`
    /// for keys that are not stored. An empty input returns immediately
    /// without opening the database.
    pub async fn multi_get(
        &self,
        keys: &[String],
    ) -> Result<Vec<(String, Option<String>)>, StorageError> {
        self.counters.record(Operation::MultiGet);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(count = keys.len(), "kv multi_get");

        let keys = keys.to_vec();
        self.run(Operation::MultiGet, move |conn| {
            let tx = conn.transaction()?;
            let mut found: HashMap<String, Option<String>> = HashMap::with_capacity(keys.len());
            for chunk in keys.chunks(MAX_KEYS_PER_STATEMENT) {
                let sql = format!(
                    "SELECT key, value FROM kv WHERE key IN ({})",
                    placeholders(chunk.len())
                );
                let mut stmt = tx.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk.iter()), KvRow::from_row)?;
                for row in rows {
                    let row = row?;
                    found.insert(row.key, row.value);
                }
            }
            tx.commit()?;

            Ok(keys
                .into_iter()
                .map(|key| {
                    let value = found.get(&key).cloned().flatten();
                    (key, value)
                })
                .collect())
        })
        .await
    }

    /// Upserts many records atomically: either every entry is written or
    /// none is.
    pub async fn multi_set(&self, entries: &[(String, String)]) -> Result<(), StorageError> {
        self.counters.record(Operation::MultiSet);
        if entries.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = entries.len(), "kv multi_set");

        let entries = entries.to_vec();
        self.run(Operation::MultiSet, move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            {
                let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
                for (key, value) in &entries {
                    stmt.execute(params![key, value])?;
                }
            }
            tx.commit()
        })
        .await
    }

    /// Deletes many keys atomically with an IN-list delete.
    pub async fn multi_remove(&self, keys: &[String]) -> Result<(), StorageError> {
        self.counters.record(Operation::MultiRemove);
        if keys.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = keys.len(), "kv multi_remove");

        let keys = keys.to_vec();
        self.run(Operation::MultiRemove, move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            for chunk in keys.chunks(MAX_KEYS_PER_STATEMENT) {
                let sql = format!(
                    "DELETE FROM kv WHERE key IN ({})",
                    placeholders(chunk.len())
                );
                tx.execute(&sql, params_from_iter(chunk.iter()))?;
            }
            tx.commit()
        })
        .await
    }

    /// Deletes every record.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.counters.record(Operation::Clear);
        self.run(Operation::Clear, |conn| {
            conn.execute("DELETE FROM kv", [])?;
            Ok(())
        })
        .await
    }

    /// Record count and on-disk size. Does not touch the counters.
    pub async fn footprint(&self) -> Result<StorageFootprint, StorageError> {
        let key_count = self
            .run(Operation::GetAllKeys, |conn| {
                conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get::<_, i64>(0))
            })
            .await?;

        let db_bytes = match &self.db_path {
            Some(path) => on_disk_bytes(path).await,
            None => None,
        };

        Ok(StorageFootprint {
            key_count: u64::try_from(key_count).unwrap_or_default(),
            db_bytes,
        })
    }
}

/// Main file size plus the write-ahead log, which holds commits not yet
/// checkpointed. `None` if the main file cannot be read.
async fn on_disk_bytes(path: &Path) -> Option<u64> {
    let main = tokio::fs::metadata(path).await.ok()?.len();
    let wal = tokio::fs::metadata(wal_path(path))
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    Some(main + wal)
}

fn wal_path(path: &Path) -> PathBuf {
    let mut wal = path.as_os_str().to_owned();
    wal.push("-wal");
    PathBuf::from(wal)
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_match_count() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?,?,?");
    }

    #[test]
    fn wal_path_appends_suffix() {
        assert_eq!(
            wal_path(Path::new("/data/listsync_kv.db")),
            PathBuf::from("/data/listsync_kv.db-wal")
        );
    }

    #[test]
    fn in_memory_engine_has_no_path() {
        let engine = KvEngine::in_memory();
        assert!(engine.db_path().is_none());
        assert!(!engine.is_initialized());
    }

    #[test]
    fn file_engine_remembers_path() {
        let engine = KvEngine::open_lazy("/tmp/listsync-test.db", DbRuntimeSettings::default());
        assert_eq!(engine.db_path(), Some(Path::new("/tmp/listsync-test.db")));
        assert!(!engine.is_initialized(), "open_lazy must not touch the file");
    }
}
