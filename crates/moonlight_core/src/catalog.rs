//! Collection catalog seam.
//!
//! The store tells a catalog when a collection is first opened and when it
//! is dropped, so other layers can enumerate collections. The production
//! catalog is [`Registry`](crate::Registry).

use crate::error::CoreResult;
use crate::paths::CollectionPaths;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Catalog entry describing one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Catalog identifier, used by the HTTP surface.
    pub id: i64,
    /// Logical collection name.
    pub name: String,
    /// Data file path.
    pub path: String,
    /// Log file path.
    pub logs_path: String,
    /// Creation time, `dd-mm-YYYY HH:MM:SS`.
    pub created_at: String,
    /// User that created the collection.
    pub author: String,
}

/// Receives collection lifecycle notifications.
///
/// The store calls both methods while holding the collection lock and
/// passes its own lock timeout, which bounds any lock the catalog takes.
pub trait CollectionCatalog: Send + Sync {
    /// Records that a collection exists.
    ///
    /// Returns the new entry, or `None` if the name was already registered.
    fn register(
        &self,
        paths: &CollectionPaths,
        author: &str,
        lock_timeout: Option<Duration>,
    ) -> CoreResult<Option<CollectionInfo>>;

    /// Forgets a dropped collection. Unknown names are ignored.
    fn unregister(&self, name: &str, lock_timeout: Option<Duration>) -> CoreResult<()>;
}
