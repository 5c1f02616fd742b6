//! Stress tests for Moonlight.
//!
//! These helpers drive a collection under heavy load. Concurrent helpers give
//! every thread its own [`Store`] handle, the same way separate processes
//! would share a collection.

use moonlight_core::{RecordId, Store, StoreConfig};
use serde_json::json;
use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
    /// Ids returned by successful pushes.
    pub ids: Vec<RecordId>,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
            ids: Vec::new(),
        }
    }

    /// Attaches the ids produced by the run.
    #[must_use]
    pub fn with_ids(mut self, ids: Vec<RecordId>) -> Self {
        self.ids = ids;
        self
    }

    /// Returns the number of distinct ids.
    pub fn distinct_ids(&self) -> usize {
        self.ids.iter().collect::<HashSet<_>>().len()
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Length of the string payload in each record.
    pub payload_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            payload_size: 32,
        }
    }
}

/// Run a sequential push stress test.
pub fn stress_sequential_pushes(store: &Store, config: &StressConfig) -> StressTestResult {
    let payload = "x".repeat(config.payload_size);
    let start = Instant::now();
    let mut ids = Vec::with_capacity(config.operations);
    let mut failed = 0usize;

    for i in 0..config.operations {
        match store.push(json!({ "seq": i, "payload": payload })) {
            Ok(id) => ids.push(id),
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(ids.len(), failed, start.elapsed()).with_ids(ids)
}

/// Run concurrent pushes from `config.threads` independent handles.
///
/// Operations are split evenly; the remainder goes to the first thread.
pub fn stress_concurrent_pushes(name: &str, store_config: &StoreConfig, config: &StressConfig) -> StressTestResult {
    let threads = config.threads.max(1);
    let per_thread = config.operations / threads;
    let remainder = config.operations % threads;
    let payload = "x".repeat(config.payload_size);

    let start = Instant::now();
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let name = name.to_string();
            let store_config = store_config.clone();
            let payload = payload.clone();
            let count = per_thread + if t == 0 { remainder } else { 0 };

            thread::spawn(move || {
                let mut ids = Vec::with_capacity(count);
                let mut failed = 0usize;
                let store = match Store::open(&name, &store_config) {
                    Ok(store) => store,
                    Err(_) => return (ids, count),
                };
                for i in 0..count {
                    match store.push(json!({ "thread": t, "seq": i, "payload": payload })) {
                        Ok(id) => ids.push(id),
                        Err(_) => failed += 1,
                    }
                }
                (ids, failed)
            })
        })
        .collect();

    let mut ids = Vec::with_capacity(config.operations);
    let mut failed = 0usize;
    for handle in handles {
        match handle.join() {
            Ok((thread_ids, thread_failed)) => {
                ids.extend(thread_ids);
                failed += thread_failed;
            }
            Err(_) => failed += per_thread,
        }
    }

    StressTestResult::new(ids.len(), failed, start.elapsed()).with_ids(ids)
}

/// Run a mixed workload: push, get, update and count in rotation.
pub fn stress_mixed_operations(store: &Store, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;
    let mut last: Option<RecordId> = None;

    for i in 0..config.operations {
        let ok = match (i % 4, last) {
            (1, Some(id)) => store.get(&json!({ "id": id })).is_ok(),
            (2, Some(id)) => store.update(json!({ "id": id, "touched": i })).is_ok(),
            (3, _) => store.count("bucket", json!(i % 7)).is_ok(),
            _ => match store.push(json!({ "bucket": i % 7 })) {
                Ok(id) => {
                    last = Some(id);
                    true
                }
                Err(_) => false,
            },
        };
        if ok {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestStore;

    fn small() -> StressConfig {
        StressConfig {
            operations: 40,
            threads: 4,
            payload_size: 8,
        }
    }

    #[test]
    fn test_sequential_pushes() {
        let test_store = TestStore::new("stress");
        let result = stress_sequential_pushes(&test_store, &small());
        assert_eq!(result.successful_ops, 40);
        assert_eq!(result.distinct_ids(), 40);
        assert_eq!(test_store.length().unwrap(), 40);
    }

    #[test]
    fn test_concurrent_pushes() {
        let test_store = TestStore::new("stress");
        let config = StressConfig {
            operations: 42,
            ..small()
        };
        let result = stress_concurrent_pushes("stress", &test_store.config, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.distinct_ids(), 42);
        assert_eq!(test_store.length().unwrap(), 42);
    }

    #[test]
    fn test_mixed_operations() {
        let test_store = TestStore::new("stress");
        let result = stress_mixed_operations(&test_store, &small());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(test_store.length().unwrap(), 10);
    }
}
