//! # Moonlight Testkit
//!
//! Test utilities for Moonlight.
//!
//! This crate provides:
//! - Test fixtures backed by temporary directories
//! - Property-based test generators using proptest
//! - Stress testing utilities for concurrent access
//!
//! ## Usage
//!
//! ```rust,ignore
//! use moonlight_testkit::prelude::*;
//! use serde_json::json;
//!
//! #[test]
//! fn test_with_store() {
//!     with_temp_store(|store| {
//!         let id = store.push(json!({"name": "Ann"})).unwrap();
//!         assert_eq!(store.length().unwrap(), 1);
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
