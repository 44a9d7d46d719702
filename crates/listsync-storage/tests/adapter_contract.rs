//! Contract tests run against every `AsyncStorage` backend.
//!
//! The sync client only sees `dyn AsyncStorage`, so both backends must
//! behave the same for the operations it relies on.

use std::sync::Arc;

use listsync_db::DbRuntimeSettings;
use listsync_storage::{AsyncStorage, KvEngine, MemoryStorage, SqliteStorage, BACKEND_MARKER};

fn backends() -> Vec<Arc<dyn AsyncStorage>> {
    let sqlite: Arc<dyn AsyncStorage> =
        Arc::new(SqliteStorage::new(Arc::new(KvEngine::in_memory())));
    let memory: Arc<dyn AsyncStorage> = Arc::new(MemoryStorage::new());
    vec![sqlite, memory]
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn missing_key_reads_as_none() {
    for storage in backends() {
        assert_eq!(
            storage.get_item("nope").await.expect("get_item should succeed"),
            None,
            "backend {}",
            storage.backend()
        );
    }
}

#[tokio::test]
async fn multi_get_scenario() {
    for storage in backends() {
        storage.set_item("a", "1").await.expect("set a");
        storage.set_item("b", "2").await.expect("set b");

        let pairs = storage
            .multi_get(&strings(&["a", "c", "b"]))
            .await
            .expect("multi_get should succeed");

        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), Some("1".to_string())),
                ("c".to_string(), None),
                ("b".to_string(), Some("2".to_string())),
            ],
            "backend {}",
            storage.backend()
        );
    }
}

#[tokio::test]
async fn multi_remove_scenario() {
    for storage in backends() {
        storage
            .multi_set(&[
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("keep".to_string(), "3".to_string()),
            ])
            .await
            .expect("multi_set should succeed");

        storage
            .multi_remove(&strings(&["a", "b"]))
            .await
            .expect("multi_remove should succeed");

        let keys = storage.get_all_keys().await.expect("get_all_keys should succeed");
        assert!(!keys.contains(&"a".to_string()));
        assert!(!keys.contains(&"b".to_string()));
        assert!(keys.contains(&"keep".to_string()));
    }
}

#[tokio::test]
async fn remove_and_clear() {
    for storage in backends() {
        storage.set_item("x", "1").await.expect("set x");
        storage.set_item("y", "2").await.expect("set y");

        storage.remove_item("x").await.expect("remove x");
        assert_eq!(storage.get_item("x").await.expect("get x"), None);

        storage.clear().await.expect("clear should succeed");
        assert!(storage.get_all_keys().await.expect("keys").is_empty());
    }
}

#[tokio::test]
async fn last_write_wins() {
    for storage in backends() {
        storage.set_item("k", "v1").await.expect("set v1");
        storage.set_item("k", "v2").await.expect("set v2");
        assert_eq!(
            storage.get_item("k").await.expect("get"),
            Some("v2".to_string())
        );
    }
}

#[tokio::test]
async fn backend_markers_differ() {
    let markers: Vec<&str> = backends().iter().map(|s| s.backend()).collect();
    assert_eq!(markers, vec![BACKEND_MARKER, "memory"]);
}

#[tokio::test]
async fn sqlite_stats_follow_contract_calls() {
    let storage = SqliteStorage::new(Arc::new(KvEngine::in_memory()));
    let dyn_storage: &dyn AsyncStorage = &storage;

    dyn_storage.set_item("a", "1").await.expect("set");
    dyn_storage.get_item("a").await.expect("get");
    dyn_storage.multi_get(&[]).await.expect("multi_get");
    dyn_storage.get_all_keys().await.expect("keys");

    let stats = dyn_storage.stats().expect("sqlite backend keeps stats");
    let map = stats.to_map();
    assert_eq!(map["setItem"], 1);
    assert_eq!(map["getItem"], 1);
    assert_eq!(map["multiGet"], 1);
    assert_eq!(map["getAllKeys"], 1);
    assert_eq!(map["clear"], 0);
}

#[tokio::test]
async fn file_store_persists_between_adapters() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("listsync_kv.db");

    {
        let storage = SqliteStorage::open(&path, DbRuntimeSettings::default());
        storage
            .multi_set(&[("session".to_string(), r#"{"user":null}"#.to_string())])
            .await
            .expect("multi_set should succeed");
    }

    let storage = SqliteStorage::open(&path, DbRuntimeSettings::default());
    assert_eq!(
        storage.get_item("session").await.expect("get_item"),
        Some(r#"{"user":null}"#.to_string())
    );
    assert_eq!(storage.get_stats().get_item, 1, "counters start fresh per engine");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_all_land() {
    let storage: Arc<dyn AsyncStorage> = Arc::new(SqliteStorage::new(Arc::new(KvEngine::in_memory())));

    let mut handles = Vec::new();
    for i in 0..32 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            let key = format!("k{i}");
            storage.set_item(&key, &i.to_string()).await?;
            storage.get_item(&key).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let value = handle
            .await
            .expect("task should not panic")
            .expect("set/get should succeed");
        assert_eq!(value, Some(i.to_string()), "read-your-writes for k{i}");
    }

    assert_eq!(storage.get_all_keys().await.expect("keys").len(), 32);
}
