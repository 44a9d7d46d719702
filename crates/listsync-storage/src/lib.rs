//! Local key-value persistence for the listsync client.
//!
//! The sync client persists its state through the [`AsyncStorage`]
//! contract: single and batch get, set and remove, key enumeration and
//! clear, all asynchronous. This crate backs that contract with one SQLite
//! table so the client cannot tell it from a platform-native store.
//!
//! # Layers
//!
//! | Type | Role |
//! |------|------|
//! | [`KvEngine`] | Owns the lazily opened pool, runs SQL, keeps counters |
//! | [`SqliteStorage`] | Forwards the contract to the engine, adds the backend marker |
//! | [`MemoryStorage`] | Non-persistent stand-in with the same contract |
//!
//! # Consistency
//!
//! A read awaited after a write on the same key observes that write.
//! Operations issued concurrently without awaiting are not ordered with
//! respect to each other. `multi_set` and `multi_remove` are atomic.
//!
//! # Usage
//!
//! ```rust,ignore
//! use listsync_storage::{AsyncStorage, SqliteStorage};
//!
//! let storage = SqliteStorage::open("listsync_kv.db", Default::default());
//! storage.set_item("a", "1").await?;
//! storage.set_item("b", "2").await?;
//! let pairs = storage
//!     .multi_get(&["a".into(), "c".into(), "b".into()])
//!     .await?;
//! // [("a", Some("1")), ("c", None), ("b", Some("2"))]
//! ```

mod adapter;
mod contract;
mod engine;
mod error;
mod memory;
mod stats;

pub use adapter::{SqliteStorage, BACKEND_MARKER};
pub use contract::AsyncStorage;
pub use engine::{open_kv_pool, KvEngine, KvRow, StorageFootprint, MAX_KEYS_PER_STATEMENT};
pub use error::{InitError, StorageError};
pub use memory::{MemoryStorage, MEMORY_BACKEND_MARKER};
pub use stats::{Operation, StorageStats};
