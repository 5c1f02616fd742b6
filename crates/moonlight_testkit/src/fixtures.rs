//! Test fixtures and store helpers.
//!
//! Every fixture lives in its own temporary root, removed on drop.

use moonlight_core::{Record, Store, StoreConfig};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

/// Collection name used by the helpers.
pub const TEST_COLLECTION: &str = "test";

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// Settings the store was opened with.
    pub config: StoreConfig,
    /// The temporary root (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestStore {
    /// Opens `name` in a fresh temporary root.
    pub fn new(name: &str) -> Self {
        Self::with_config(name, |config| config)
    }

    /// Opens `name` with adjusted settings.
    pub fn with_config(name: &str, adjust: impl FnOnce(StoreConfig) -> StoreConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = adjust(StoreConfig::new(temp_dir.path()));
        let store = Store::open(name, &config).expect("Failed to open store");
        Self {
            store,
            config,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the temporary root.
    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Opens a second, independent handle on the same collection.
    pub fn reopen(&self) -> Store {
        Store::open(self.store.name(), &self.config).expect("Failed to reopen store")
    }

    /// Returns the raw bytes of the data file.
    pub fn file_bytes(&self) -> Vec<u8> {
        std::fs::read(&self.store.paths().data).expect("Failed to read data file")
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary store.
///
/// # Example
///
/// ```rust,ignore
/// use moonlight_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|store| {
///         store.push(json!({"a": 1})).unwrap();
///     });
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test_store = TestStore::new(TEST_COLLECTION);
    f(&test_store.store)
}

/// Runs a test with a temporary store and its root directory.
pub fn with_temp_root<F, R>(f: F) -> R
where
    F: FnOnce(&Store, &Path) -> R,
{
    let test_store = TestStore::new(TEST_COLLECTION);
    f(&test_store.store, test_store.root())
}

/// Converts a JSON object literal into a [`Record`].
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a store holding `count` records `{"index": i, "even": bool}`.
    pub fn populated_store(count: usize) -> TestStore {
        let test_store = TestStore::new(TEST_COLLECTION);
        for i in 0..count {
            test_store
                .push(json!({ "index": i, "even": i % 2 == 0 }))
                .expect("Failed to push record");
        }
        test_store
    }

    /// Creates a store holding the `users` sample: Ann (30), Bob (25),
    /// Cid (30).
    pub fn users_store() -> TestStore {
        let test_store = TestStore::new("users");
        for (name, age) in [("Ann", 30), ("Bob", 25), ("Cid", 30)] {
            test_store
                .push(json!({ "name": name, "age": age }))
                .expect("Failed to push record");
        }
        test_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_store() {
        with_temp_store(|store| {
            assert_eq!(store.name(), TEST_COLLECTION);
            assert_eq!(store.length().unwrap(), 0);
        });
    }

    #[test]
    fn test_reopen_shares_file() {
        let test_store = TestStore::new("shared");
        test_store.push(json!({"a": 1})).unwrap();
        assert_eq!(test_store.reopen().length().unwrap(), 1);
        assert!(test_store.root().join("databases").join("shared.json").exists());
    }

    #[test]
    fn test_populated_scenario() {
        let test_store = scenarios::populated_store(10);
        assert_eq!(test_store.length().unwrap(), 10);
        assert_eq!(test_store.count("even", json!(true)).unwrap(), 5);

        let users = scenarios::users_store();
        assert_eq!(users.count("age", json!(30)).unwrap(), 2);
    }
}
