//! Concurrent access and identifier uniqueness.

use moonlight_core::{RecordId, Store, StoreConfig};
use moonlight_testkit::prelude::*;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn generated_ids_are_unique() {
    let ids: HashSet<RecordId> = (0..10_000).map(|_| RecordId::generate()).collect();
    assert_eq!(ids.len(), 10_000);
}

#[test]
fn pushes_yield_distinct_ids() {
    let test_store = TestStore::new("ids");
    let result = stress_sequential_pushes(
        &test_store,
        &StressConfig {
            operations: 1_000,
            threads: 1,
            payload_size: 0,
        },
    );
    assert_eq!(result.successful_ops, 1_000);
    assert_eq!(result.distinct_ids(), 1_000);
}

#[test]
#[ignore = "slow: rewrites the data file 10,000 times"]
fn ten_thousand_pushes_yield_distinct_ids() {
    let test_store = TestStore::new("ids");
    assert!(!test_store.config.unique_ids);

    let result = stress_sequential_pushes(
        &test_store,
        &StressConfig {
            operations: 10_000,
            threads: 1,
            payload_size: 0,
        },
    );
    result.print_summary("10,000 sequential pushes");
    assert_eq!(result.distinct_ids(), 10_000);
    assert_eq!(test_store.length().unwrap(), 10_000);
}

#[test]
fn concurrent_pushes_lose_nothing() {
    let test_store = TestStore::new("shared");
    let config = StressConfig {
        operations: 200,
        threads: 8,
        payload_size: 16,
    };

    let result = stress_concurrent_pushes("shared", &test_store.config, &config);
    assert_eq!(result.failed_ops, 0);
    assert_eq!(result.distinct_ids(), 200);

    let stored: HashSet<i64> = test_store
        .all()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(stored.len(), 200);
    let returned: HashSet<i64> = result.ids.iter().map(RecordId::as_i64).collect();
    assert_eq!(stored, returned);
}

#[test]
fn concurrent_updates_are_not_lost() {
    let test_store = TestStore::new("counters");
    let id = test_store.push(json!({"hits": 0})).unwrap();
    let store = Arc::new(test_store.reopen());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..10 {
                    store
                        .update(json!({"id": id, format!("t{t}"): i + 1}))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let record = &test_store.get(&json!({"id": id})).unwrap()[0];
    for t in 0..4 {
        assert_eq!(record[format!("t{t}").as_str()], 10);
    }
}

#[test]
fn busy_collection_times_out() {
    let test_store = TestStore::new("busy");
    let config = StoreConfig::new(test_store.root()).lock_timeout(Duration::from_millis(50));
    let other = Store::open("busy", &config).unwrap();

    let lock = moonlight_core::FileLock::acquire(&test_store.paths().lock, None).unwrap();
    assert!(matches!(
        other.push(json!({"a": 1})),
        Err(moonlight_core::CoreError::LockTimeout { .. })
    ));
    drop(lock);

    other.push(json!({"a": 1})).unwrap();
    assert_eq!(test_store.length().unwrap(), 1);
}
