//! Collection store engine.
//!
//! A [`Store`] is bound to one collection. It keeps no copy of the data:
//! every operation takes the collection's file lock, loads the whole file,
//! works on it, persists if anything changed, and releases the lock. Two
//! stores on the same collection, in one process or many, therefore never
//! interleave their read and write phases.

use crate::activity::{ActivityLog, LogLevel};
use crate::catalog::CollectionCatalog;
use crate::config::StoreConfig;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;
use crate::lock::FileLock;
use crate::paths::CollectionPaths;
use crate::query::{is_falsy, type_name, Query, Record};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Author recorded for collections opened without an explicit creator.
pub const SYSTEM_AUTHOR: &str = "moonlight";

/// Handle on one collection.
///
/// # Example
///
/// ```rust,ignore
/// use moonlight_core::{Store, StoreConfig};
/// use serde_json::json;
///
/// let store = Store::open("users", &StoreConfig::new("/srv/moon"))?;
/// let id = store.push(json!({"name": "Ann", "age": 30}))?;
/// let found = store.get(&json!({"name": "Ann"}))?;
/// assert_eq!(found[0]["id"], json!(id.as_i64()));
/// ```
pub struct Store {
    paths: CollectionPaths,
    primary_key: String,
    lock_timeout: Option<Duration>,
    unique_ids: bool,
    author: String,
    log: ActivityLog,
    catalog: Option<Arc<dyn CollectionCatalog>>,
}

impl Store {
    /// Opens (creating if absent) the collection `name`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a bad name, `LockTimeout` if the lock is
    /// busy past the configured timeout, and storage errors from creating
    /// the file.
    pub fn open(name: &str, config: &StoreConfig) -> CoreResult<Self> {
        Self::build(name, config, None, SYSTEM_AUTHOR)
    }

    /// Opens a collection and registers it with `catalog` as created by
    /// `author`.
    pub fn open_with_catalog(
        name: &str,
        config: &StoreConfig,
        catalog: Arc<dyn CollectionCatalog>,
        author: &str,
    ) -> CoreResult<Self> {
        Self::build(name, config, Some(catalog), author)
    }

    fn build(
        name: &str,
        config: &StoreConfig,
        catalog: Option<Arc<dyn CollectionCatalog>>,
        author: &str,
    ) -> CoreResult<Self> {
        let paths = config.resolver().resolve(name)?;
        let log = ActivityLog::new(paths.name.clone(), paths.log.clone(), &config.log_levels);

        let store = Self {
            paths,
            primary_key: config.primary_key.clone(),
            lock_timeout: config.lock_timeout,
            unique_ids: config.unique_ids,
            author: author.to_string(),
            log,
            catalog,
        };

        {
            let _lock = store.lock()?;
            store.ensure_file()?;
            if let Some(catalog) = &store.catalog {
                catalog.register(&store.paths, &store.author, store.lock_timeout)?;
            }
        }

        store.log.write(LogLevel::Info, "connected to database");
        Ok(store)
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.paths.name
    }

    /// Returns the collection's files.
    #[must_use]
    pub fn paths(&self) -> &CollectionPaths {
        &self.paths
    }

    /// Returns the primary key field name.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Inserts a record and returns its generated id.
    ///
    /// The id is stored under the primary key as the record's first field;
    /// a primary key supplied by the caller is replaced.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `record` is not an object, `EmptyInput` if it has
    /// no fields.
    pub fn push(&self, record: Value) -> CoreResult<RecordId> {
        let result = self.try_push(record);
        self.report("push", result)
    }

    fn try_push(&self, record: Value) -> CoreResult<RecordId> {
        let fields = match record {
            Value::Object(fields) if fields.is_empty() => return Err(CoreError::EmptyInput),
            Value::Object(fields) => fields,
            other => {
                return Err(CoreError::invalid_input(format!(
                    "push expects an object, got {}",
                    type_name(&other)
                )))
            }
        };

        let (id, stored) = self.modify(|doc| {
            let id = self.next_id(&doc.records);

            let mut stored = Record::new();
            stored.insert(self.primary_key.clone(), id.into());
            for (key, value) in fields {
                if key != self.primary_key {
                    stored.insert(key, value);
                }
            }

            doc.records.push(stored.clone());
            Ok((id, stored))
        })?;

        self.log
            .write(LogLevel::Success, format!("pushed {}", Value::Object(stored)));
        Ok(id)
    }

    /// Returns every record in insertion order.
    pub fn all(&self) -> CoreResult<Vec<Record>> {
        let result = self.read(|records| records.to_vec());
        if result.is_ok() {
            self.log.write(LogLevel::Success, "read all records");
        }
        self.report("all", result)
    }

    /// Returns the records matching every field of `query`, in storage order.
    ///
    /// No match is a success with an empty list.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `query` is not an object, `EmptyQuery` if it has no
    /// fields.
    pub fn get(&self, query: &Value) -> CoreResult<Vec<Record>> {
        let result = Query::from_value(query).and_then(|query| {
            self.read(|records| {
                records
                    .iter()
                    .filter(|record| query.matches(record))
                    .cloned()
                    .collect::<Vec<_>>()
            })
        });

        if let Ok(found) = &result {
            if found.is_empty() {
                self.log
                    .write(LogLevel::Warning, format!("no result for query {query}"));
            } else {
                self.log
                    .write(LogLevel::Success, format!("found {} record(s) for {query}", found.len()));
            }
        }
        self.report("get", result)
    }

    /// Merges `patch` into every record whose primary key equals the patch's.
    ///
    /// Merging is shallow and overwrites field by field, the primary key
    /// included. Returns the coerced id when at least one record changed.
    ///
    /// # Errors
    ///
    /// `MissingId` if the patch has no (or a falsy) primary key,
    /// `InvalidInput` if it is not an object or the key is not an integer,
    /// `NotFound` if no record matched. The file is untouched on error.
    pub fn update(&self, patch: Value) -> CoreResult<RecordId> {
        let result = self.try_update(patch);
        self.report("update", result)
    }

    fn try_update(&self, patch: Value) -> CoreResult<RecordId> {
        let patch = match patch {
            Value::Object(patch) => patch,
            other => {
                return Err(CoreError::invalid_input(format!(
                    "update expects an object, got {}",
                    type_name(&other)
                )))
            }
        };

        let id = match patch.get(&self.primary_key) {
            Some(value) if !is_falsy(value) => RecordId::coerce(value)?,
            _ => return Err(CoreError::missing_id(&self.primary_key)),
        };

        let updated = self.modify(|doc| {
            let mut updated = 0usize;
            for record in &mut doc.records {
                let hit = record
                    .get(&self.primary_key)
                    .is_some_and(|stored| id.matches(stored));
                if hit {
                    for (key, value) in &patch {
                        record.insert(key.clone(), value.clone());
                    }
                    updated += 1;
                }
            }

            if updated == 0 {
                return Err(CoreError::NotFound { id: id.as_i64() });
            }
            Ok(updated)
        })?;

        self.log
            .write(LogLevel::Success, format!("updated {updated} record(s) with id {id}"));
        Ok(id)
    }

    /// Removes the record(s) with primary key `id` and returns the first.
    ///
    /// # Errors
    ///
    /// `NotFound` if no record carries `id`.
    pub fn delete(&self, id: RecordId) -> CoreResult<Record> {
        let result = self.modify(|doc| {
            let pk = self.primary_key.as_str();
            let hit = |record: &Record| record.get(pk).is_some_and(|stored| id.matches(stored));

            let removed = doc
                .records
                .iter()
                .find(|&record| hit(record))
                .cloned()
                .ok_or(CoreError::NotFound { id: id.as_i64() })?;

            doc.records.retain(|record| !hit(record));
            Ok(removed)
        });
        if result.is_ok() {
            self.log.write(LogLevel::Success, format!("deleted record {id}"));
        }
        self.report("delete", result)
    }

    /// Deletes the collection's files and catalog entry.
    ///
    /// The handle stays usable: the next operation recreates an empty
    /// collection.
    pub fn drop_collection(&self) -> CoreResult<()> {
        let result = self.try_drop();
        self.report("drop", result)
    }

    fn try_drop(&self) -> CoreResult<()> {
        let lock = self.lock()?;

        self.log.write(LogLevel::Info, "dropping database");
        self.log.stop();

        remove_if_exists(&self.paths.data)?;
        remove_if_exists(&self.paths.temp())?;
        remove_if_exists(&self.paths.log)?;

        if let Some(catalog) = &self.catalog {
            catalog.unregister(&self.paths.name, self.lock_timeout)?;
        }

        lock.remove_file()?;
        Ok(())
    }

    /// Returns true if some record has `key` equal to `value`.
    pub fn contains(&self, key: &str, value: Value) -> CoreResult<bool> {
        let query = Query::field(key, value);
        let result = self.read(|records| records.iter().any(|record| query.matches(record)));
        self.report("contains", result)
    }

    /// Returns the number of records.
    pub fn length(&self) -> CoreResult<usize> {
        let result = self.read(<[Record]>::len);
        self.report("length", result)
    }

    /// Returns the number of records with `key` equal to `value`.
    pub fn count(&self, key: &str, value: Value) -> CoreResult<usize> {
        let query = Query::field(key, value);
        let result = self.read(|records| records.iter().filter(|r| query.matches(r)).count());
        self.report("count", result)
    }

    fn lock(&self) -> CoreResult<FileLock> {
        FileLock::acquire(&self.paths.lock, self.lock_timeout)
    }

    /// Seeds the data file if it is missing. Caller must hold the lock.
    fn ensure_file(&self) -> CoreResult<bool> {
        if self.paths.data.exists() {
            return Ok(false);
        }
        Document::new().save(&self.paths.data, &self.paths.temp())?;
        Ok(true)
    }

    /// Loads the collection under the lock and runs a read-only view.
    fn read<T>(&self, view: impl FnOnce(&[Record]) -> T) -> CoreResult<T> {
        let _lock = self.lock()?;
        self.recreate_if_dropped()?;
        let doc = Document::load(&self.paths.data)?;
        Ok(view(&doc.records))
    }

    /// Loads, mutates and persists the collection under the lock.
    ///
    /// Nothing is written when `mutate` fails.
    fn modify<T>(&self, mutate: impl FnOnce(&mut Document) -> CoreResult<T>) -> CoreResult<T> {
        let _lock = self.lock()?;
        self.recreate_if_dropped()?;
        let mut doc = Document::load(&self.paths.data)?;
        let out = mutate(&mut doc)?;
        doc.save(&self.paths.data, &self.paths.temp())?;
        Ok(out)
    }

    fn recreate_if_dropped(&self) -> CoreResult<()> {
        if self.ensure_file()? {
            if let Some(catalog) = &self.catalog {
                catalog.register(&self.paths, &self.author, self.lock_timeout)?;
            }
        }
        Ok(())
    }

    fn next_id(&self, records: &[Record]) -> RecordId {
        if !self.unique_ids {
            return RecordId::generate();
        }

        let taken: HashSet<i64> = records
            .iter()
            .filter_map(|r| r.get(&self.primary_key).and_then(Value::as_i64))
            .collect();
        loop {
            let id = RecordId::generate();
            if !taken.contains(&id.as_i64()) {
                return id;
            }
        }
    }

    fn report<T>(&self, command: &str, result: CoreResult<T>) -> CoreResult<T> {
        if let Err(e) = &result {
            self.log
                .write(LogLevel::Error, format!("{}: {e}", command.to_ascii_uppercase()));
        }
        result
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("paths", &self.paths)
            .field("primary_key", &self.primary_key)
            .field("lock_timeout", &self.lock_timeout)
            .field("unique_ids", &self.unique_ids)
            .finish_non_exhaustive()
    }
}

fn remove_if_exists(path: &Path) -> CoreResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
