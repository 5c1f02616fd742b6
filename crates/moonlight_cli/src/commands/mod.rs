//! CLI command implementations.
//!
//! Commands return the text to print so they can be exercised in tests.

pub mod apply;
pub mod data;
pub mod databases;
pub mod serve;
pub mod settings;
pub mod users;

use crate::error::{CliError, CliResult};
use moonlight_core::{CollectionCatalog, Registry, Store, StoreConfig};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Paths and settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    root: PathBuf,
    lock_timeout: Duration,
}

impl Context {
    /// Creates a context rooted at `root` with the default lock timeout.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout: moonlight_server::DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Sets how long commands wait for collection and registry locks.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Returns the application root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store settings with the registry's log levels applied.
    pub fn store_config(&self, registry: &Registry) -> CliResult<StoreConfig> {
        let app = registry.snapshot()?;
        Ok(StoreConfig::new(&self.root)
            .lock_timeout(self.lock_timeout)
            .log_levels(app.effective_log_levels()))
    }

    /// Opens (creating if absent) the registry.
    pub fn registry(&self) -> CliResult<Arc<Registry>> {
        let path = StoreConfig::new(&self.root).registry_path();
        Ok(Arc::new(Registry::open_with_lock_timeout(&path, Some(self.lock_timeout))?))
    }

    /// Opens a collection registered under `author`.
    pub fn open(&self, name: &str, author: &str) -> CliResult<Store> {
        let registry = self.registry()?;
        let config = self.store_config(&registry)?;
        let catalog: Arc<dyn CollectionCatalog> = registry;
        Ok(Store::open_with_catalog(name, &config, catalog, author)?)
    }
}

/// Parses a JSON argument.
pub fn parse_json(what: &'static str, raw: &str) -> CliResult<Value> {
    serde_json::from_str(raw).map_err(|source| CliError::InvalidJson { what, source })
}

/// Parses a value argument: JSON if it parses, otherwise a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Aligned text.
    Text,
    /// Pretty JSON.
    Json,
}

fn pretty(value: &impl serde::Serialize) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::Core(e.into()))
}
