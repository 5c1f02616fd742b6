//! Collection path resolution.
//!
//! Every collection maps onto three files under the working directory:
//!
//! ```text
//! <root>/
//! ├─ databases/
//! │  ├─ <name>.json        # Collection data
//! │  └─ <name>.json.lock   # Advisory lock sentinel
//! └─ logs/
//!    └─ <name>.log         # Activity log
//! ```
//!
//! Resolution is pure: nothing here touches the file system.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Extension of collection data files.
pub const DATA_EXT: &str = "json";
/// Extension of collection log files.
pub const LOG_EXT: &str = "log";
/// Suffix appended to the data file name to form the lock file name.
pub const LOCK_SUFFIX: &str = ".lock";

/// The on-disk files belonging to one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPaths {
    /// Logical collection name (file stem).
    pub name: String,
    /// JSON data file.
    pub data: PathBuf,
    /// Lock sentinel next to the data file.
    pub lock: PathBuf,
    /// Append-only activity log.
    pub log: PathBuf,
}

impl CollectionPaths {
    /// Returns the temporary file used for atomic rewrites of the data file.
    #[must_use]
    pub fn temp(&self) -> PathBuf {
        with_suffix(&self.data, ".tmp")
    }
}

/// Maps collection names to file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    databases_dir: PathBuf,
    logs_dir: PathBuf,
}

impl PathResolver {
    /// Creates a resolver over the given data and log directories.
    pub fn new(databases_dir: impl Into<PathBuf>, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            databases_dir: databases_dir.into(),
            logs_dir: logs_dir.into(),
        }
    }

    /// Returns the directory holding data files.
    #[must_use]
    pub fn databases_dir(&self) -> &Path {
        &self.databases_dir
    }

    /// Returns the directory holding log files.
    #[must_use]
    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Resolves the files of a collection.
    ///
    /// `users`, `users.json` and `users.log` all resolve to the same paths.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the name is empty, `.`/`..`, or contains a
    /// path separator.
    pub fn resolve(&self, name: &str) -> CoreResult<CollectionPaths> {
        let name = collection_name(name)?;
        let data = self.databases_dir.join(format!("{name}.{DATA_EXT}"));
        let lock = with_suffix(&data, LOCK_SUFFIX);
        let log = self.logs_dir.join(format!("{name}.{LOG_EXT}"));

        Ok(CollectionPaths {
            name,
            data,
            lock,
            log,
        })
    }
}

/// Validates a collection name and strips its extension.
///
/// # Errors
///
/// Returns `InvalidInput` for names that cannot be a single file stem.
pub fn collection_name(name: &str) -> CoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_input("collection name is empty"));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(CoreError::invalid_input(format!(
            "collection name must not contain path separators: {trimmed}"
        )));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(CoreError::invalid_input(format!(
            "invalid collection name: {trimmed}"
        )));
    }

    let stem = Path::new(trimmed)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(trimmed);

    if stem.is_empty() {
        return Err(CoreError::invalid_input(format!(
            "invalid collection name: {trimmed}"
        )));
    }

    Ok(stem.to_string())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
