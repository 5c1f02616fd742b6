//! Error types for the CLI.

use moonlight_core::CoreError;
use moonlight_server::ServerError;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine or registry error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Server error.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An argument is not valid JSON.
    #[error("{what} is not valid JSON: {source}")]
    InvalidJson {
        /// Which argument.
        what: &'static str,
        /// Parser error.
        source: serde_json::Error,
    },

    /// An argument has the wrong format.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `serve` needs at least one administrator.
    #[error("no administrator registered; create one with `moonlight create-user`")]
    NoAdministrator,
}
