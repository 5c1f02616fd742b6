//! Error types for the HTTP surface.

use moonlight_core::{CoreError, Permission};
use serde_json::{json, Value};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while serving a request.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Required body fields are absent or empty.
    #[error("required fields are missing or empty")]
    MissingFields {
        /// Fields absent from the body.
        missing: Vec<String>,
        /// Fields present but empty.
        empty: Vec<String>,
    },

    /// Missing, unknown or expired token, or bad credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The user's permissions are below what the route needs.
    #[error("permission denied: {required} required")]
    PermissionDenied {
        /// Minimal permission of the route.
        required: Permission,
    },

    /// No route matches the method and path.
    #[error("no route for {method} {path}")]
    RouteNotFound {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// No collection carries the catalog id.
    #[error("unknown collection: {0}")]
    UnknownCollection(i64),

    /// A collection with the name already exists.
    #[error("collection `{name}` already exists")]
    CollectionExists {
        /// Requested name.
        name: String,
        /// Catalog id of the existing collection.
        id: i64,
    },

    /// Engine error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid server configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) | ServerError::MissingFields { .. } => 400,
            ServerError::AuthenticationFailed(_) => 401,
            ServerError::PermissionDenied { .. } => 403,
            ServerError::RouteNotFound { .. } | ServerError::UnknownCollection(_) => 404,
            ServerError::CollectionExists { .. } => 409,
            ServerError::Core(e) => core_status(e),
            ServerError::Config(_) | ServerError::Internal(_) | ServerError::Io(_) => 500,
        }
    }

    /// Short machine-readable kind, sent as `error` in the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::MissingFields { .. } => "missing_fields",
            ServerError::AuthenticationFailed(_) => "unauthorized",
            ServerError::PermissionDenied { .. } => "forbidden",
            ServerError::RouteNotFound { .. } => "route_not_found",
            ServerError::UnknownCollection(_) => "unknown_collection",
            ServerError::CollectionExists { .. } => "already_exists",
            ServerError::Core(e) => core_kind(e),
            ServerError::Config(_) | ServerError::Internal(_) | ServerError::Io(_) => "internal",
        }
    }

    /// Response body: `{error, message}` plus error-specific fields.
    pub fn body(&self) -> Value {
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match self {
            ServerError::MissingFields { missing, empty } => {
                body["missing_fields"] = json!(missing);
                body["empty_fields"] = json!(empty);
            }
            ServerError::CollectionExists { id, .. } => {
                body["data"] = json!({ "id": id });
            }
            _ => {}
        }
        body
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status() >= 500
    }
}

fn core_status(error: &CoreError) -> u16 {
    match error {
        e if e.is_input_error() => 400,
        CoreError::NotFound { .. } | CoreError::UnknownEntry { .. } => 404,
        CoreError::Protected { .. } => 403,
        CoreError::LockTimeout { .. } | CoreError::AlreadyExists { .. } => 409,
        _ => 500,
    }
}

fn core_kind(error: &CoreError) -> &'static str {
    match error {
        CoreError::InvalidInput { .. } => "invalid_input",
        CoreError::EmptyInput => "empty_input",
        CoreError::EmptyQuery => "empty_query",
        CoreError::MissingId { .. } => "missing_id",
        CoreError::NotFound { .. } => "not_found",
        CoreError::LockTimeout { .. } => "lock_timeout",
        CoreError::AlreadyExists { .. } => "already_exists",
        CoreError::UnknownEntry { .. } => "not_found",
        CoreError::Protected { .. } => "protected",
        CoreError::Io(_) | CoreError::CorruptFile { .. } | CoreError::Serialization(_) => {
            "storage_error"
        }
    }
}
