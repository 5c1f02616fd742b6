//! Store configuration.

use crate::activity::LogLevel;
use crate::paths::PathResolver;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default primary key field name.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Configuration for opening collections.
///
/// Passed explicitly to every [`Store`](crate::Store); there is no
/// process-wide configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Working directory all other paths are rooted under.
    pub root: PathBuf,

    /// Directory (relative to `root`) holding collection data files.
    pub databases_dir: String,

    /// Directory (relative to `root`) holding collection log files.
    pub logs_dir: String,

    /// Name of the primary key field.
    pub primary_key: String,

    /// Maximum time to wait for a collection lock (`None` = wait forever).
    pub lock_timeout: Option<Duration>,

    /// Levels written to collection log files.
    pub log_levels: Vec<LogLevel>,

    /// Re-draw generated ids that already exist in the collection.
    pub unique_ids: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            databases_dir: "databases".to_string(),
            logs_dir: "logs".to_string(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            lock_timeout: None,
            log_levels: LogLevel::ALL.to_vec(),
            unique_ids: false,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration rooted at `root` with default values.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Sets the primary key field name.
    #[must_use]
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    /// Sets the lock acquisition timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Sets the levels written to collection log files.
    #[must_use]
    pub fn log_levels(mut self, levels: impl IntoIterator<Item = LogLevel>) -> Self {
        self.log_levels = levels.into_iter().collect();
        self
    }

    /// Sets whether generated ids are checked against existing ones.
    #[must_use]
    pub const fn unique_ids(mut self, value: bool) -> Self {
        self.unique_ids = value;
        self
    }

    /// Returns the path resolver for this configuration.
    #[must_use]
    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(
            self.root.join(&self.databases_dir),
            self.root.join(&self.logs_dir),
        )
    }

    /// Returns the path of the registry file (`<root>/config.json`).
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.root.join("config.json")
    }
}
