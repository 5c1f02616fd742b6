//! Error types for Moonlight core.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Moonlight core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An argument has the wrong shape or type.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what was wrong.
        message: String,
    },

    /// A record to insert has no fields.
    #[error("nothing to push: record is empty")]
    EmptyInput,

    /// A query has no fields.
    #[error("empty query")]
    EmptyQuery,

    /// An update was issued without the primary key.
    #[error("primary key `{field}` not specified")]
    MissingId {
        /// Name of the primary key field.
        field: String,
    },

    /// No record carries the requested identifier.
    #[error("record not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: i64,
    },

    /// Exclusive access to a collection could not be obtained in time.
    #[error("lock timeout: {} not acquired within {waited:?}", path.display())]
    LockTimeout {
        /// The lock file.
        path: PathBuf,
        /// How long the caller waited.
        waited: Duration,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A data or configuration file could not be parsed.
    #[error("corrupt file {}: {message}", path.display())]
    CorruptFile {
        /// The offending file.
        path: PathBuf,
        /// Description of the corruption.
        message: String,
    },

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A registry entry with the same key already exists.
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// The kind of entry (user, collection).
        kind: &'static str,
        /// The conflicting name.
        name: String,
    },

    /// A registry entry does not exist.
    #[error("{kind} not found: {name}")]
    UnknownEntry {
        /// The kind of entry (user, collection).
        kind: &'static str,
        /// The name that was looked up.
        name: String,
    },

    /// The entry may not be removed.
    #[error("{name} is protected and cannot be removed")]
    Protected {
        /// The protected name.
        name: String,
    },
}

impl CoreError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a corrupt file error.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a missing id error.
    pub fn missing_id(field: impl Into<String>) -> Self {
        Self::MissingId {
            field: field.into(),
        }
    }

    /// Creates an unknown entry error.
    pub fn unknown(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownEntry {
            kind,
            name: name.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Returns true for I/O failures and unreadable files.
    ///
    /// These are operator problems: they are surfaced, never retried.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            CoreError::Io(_) | CoreError::CorruptFile { .. } | CoreError::Serialization(_)
        )
    }

    /// Returns true when the caller sent an unusable argument.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidInput { .. }
                | CoreError::EmptyInput
                | CoreError::EmptyQuery
                | CoreError::MissingId { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(CoreError::EmptyInput.is_input_error());
        assert!(CoreError::missing_id("id").is_input_error());
        assert!(CoreError::corrupt("a.json", "bad").is_storage_error());
        assert!(!CoreError::NotFound { id: 1 }.is_storage_error());
        assert!(!CoreError::NotFound { id: 1 }.is_input_error());
    }

    #[test]
    fn display_mentions_context() {
        let err = CoreError::LockTimeout {
            path: PathBuf::from("users.json.lock"),
            waited: Duration::from_millis(50),
        };
        assert!(err.to_string().contains("users.json.lock"));

        let err = CoreError::missing_id("uid");
        assert_eq!(err.to_string(), "primary key `uid` not specified");
    }
}
