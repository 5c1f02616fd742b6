//! # Moonlight Core
//!
//! Embedded JSON document store.
//!
//! This crate provides:
//! - Collections persisted as one pretty-printed JSON file each
//! - Cross-process mutual exclusion through advisory file locks
//! - Record operations (push, get, update, delete, drop, count)
//! - Per-collection activity logs
//! - The application registry (users, API tokens, collection catalog)
//! - Declarative validators for request bodies
//!
//! # Example
//!
//! ```rust,ignore
//! use moonlight_core::{Store, StoreConfig};
//! use serde_json::json;
//!
//! let config = StoreConfig::new("/srv/moon");
//! let users = Store::open("users", &config)?;
//!
//! let id = users.push(json!({"name": "Ann", "age": 30}))?;
//! users.update(json!({"id": id, "age": 31}))?;
//! assert_eq!(users.count("age", json!(31))?, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod activity;
mod catalog;
mod config;
mod credentials;
mod document;
mod error;
mod id;
mod lock;
mod paths;
mod query;
mod registry;
mod schema;
mod store;

pub use activity::{format_line, ActivityLog, LogLevel};
pub use catalog::{CollectionCatalog, CollectionInfo};
pub use config::{StoreConfig, DEFAULT_PRIMARY_KEY};
pub use credentials::{
    default_token_ttl, generate_token, password_hash, ApiKey, Permission, User, TOKEN_TTL_HOURS,
};
pub use document::{to_pretty_json, write_atomic, Document, DATA_FIELD};
pub use error::{CoreError, CoreResult};
pub use id::{RecordId, ID_DIGITS};
pub use lock::FileLock;
pub use paths::{collection_name, CollectionPaths, PathResolver, DATA_EXT, LOCK_SUFFIX, LOG_EXT};
pub use query::{is_falsy, type_name, values_equal, Query, Record};
pub use registry::{AppConfig, Registry, DEFAULT_HOST, DEFAULT_PORT};
pub use schema::{required_fields, FieldReport, FieldSpec, Rule, Schema, SchemaError};
pub use store::{Store, SYSTEM_AUTHOR};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
