//! Per-instance invocation counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// The eight operations of the key-value contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetItem,
    SetItem,
    RemoveItem,
    GetAllKeys,
    MultiGet,
    MultiSet,
    MultiRemove,
    Clear,
}

impl Operation {
    /// All operations, in contract order.
    pub const ALL: [Operation; 8] = [
        Operation::GetItem,
        Operation::SetItem,
        Operation::RemoveItem,
        Operation::GetAllKeys,
        Operation::MultiGet,
        Operation::MultiSet,
        Operation::MultiRemove,
        Operation::Clear,
    ];

    /// The contract method name, as reported by `getStats`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetItem => "getItem",
            Operation::SetItem => "setItem",
            Operation::RemoveItem => "removeItem",
            Operation::GetAllKeys => "getAllKeys",
            Operation::MultiGet => "multiGet",
            Operation::MultiSet => "multiSet",
            Operation::MultiRemove => "multiRemove",
            Operation::Clear => "clear",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic counters owned by one engine.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    counts: [AtomicU64; 8],
}

impl StatsCounters {
    pub(crate) fn record(&self, op: Operation) {
        self.counts[op.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StorageStats {
        let load = |op: Operation| self.counts[op.index()].load(Ordering::Relaxed);
        StorageStats {
            get_item: load(Operation::GetItem),
            set_item: load(Operation::SetItem),
            remove_item: load(Operation::RemoveItem),
            get_all_keys: load(Operation::GetAllKeys),
            multi_get: load(Operation::MultiGet),
            multi_set: load(Operation::MultiSet),
            multi_remove: load(Operation::MultiRemove),
            clear: load(Operation::Clear),
        }
    }
}

/// Snapshot of invocation counts since the engine was created.
///
/// Serializes with the contract method names as keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub get_item: u64,
    pub set_item: u64,
    pub remove_item: u64,
    pub get_all_keys: u64,
    pub multi_get: u64,
    pub multi_set: u64,
    pub multi_remove: u64,
    pub clear: u64,
}

impl StorageStats {
    /// Count for a single operation.
    pub fn get(&self, op: Operation) -> u64 {
        match op {
            Operation::GetItem => self.get_item,
            Operation::SetItem => self.set_item,
            Operation::RemoveItem => self.remove_item,
            Operation::GetAllKeys => self.get_all_keys,
            Operation::MultiGet => self.multi_get,
            Operation::MultiSet => self.multi_set,
            Operation::MultiRemove => self.multi_remove,
            Operation::Clear => self.clear,
        }
    }

    /// Total invocations across all operations.
    pub fn total(&self) -> u64 {
        Operation::ALL.iter().map(|op| self.get(*op)).sum()
    }

    /// Operation name to count.
    pub fn to_map(&self) -> BTreeMap<&'static str, u64> {
        Operation::ALL
            .iter()
            .map(|op| (op.as_str(), self.get(*op)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let counters = StatsCounters::default();
        assert_eq!(counters.snapshot(), StorageStats::default());
        assert_eq!(counters.snapshot().total(), 0);
    }

    #[test]
    fn record_bumps_only_that_operation() {
        let counters = StatsCounters::default();
        counters.record(Operation::MultiSet);
        counters.record(Operation::MultiSet);
        counters.record(Operation::Clear);

        let stats = counters.snapshot();
        assert_eq!(stats.multi_set, 2);
        assert_eq!(stats.clear, 1);
        assert_eq!(stats.get_item, 0);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn map_uses_contract_names() {
        let counters = StatsCounters::default();
        counters.record(Operation::GetAllKeys);

        let map = counters.snapshot().to_map();
        assert_eq!(map.len(), 8);
        assert_eq!(map["getAllKeys"], 1);
        assert_eq!(map["removeItem"], 0);
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let stats = StorageStats {
            multi_remove: 4,
            ..StorageStats::default()
        };
        let json = serde_json::to_value(stats).expect("stats should serialize");
        assert_eq!(json["multiRemove"], 4);
        assert_eq!(json["getItem"], 0);
    }
}
