//! # Moonlight Server
//!
//! HTTP surface for Moonlight collections.
//!
//! This crate provides:
//! - Token authentication against the registry (`POST /auth`)
//! - Per-route minimal permissions (viewer, editor, administrator)
//! - One endpoint per engine operation, addressed by catalog id
//! - `{data}` / `{error, message}` envelopes with mapped status codes
//!
//! # Endpoints
//!
//! | Route                  | Permission    | Engine call        |
//! |------------------------|---------------|--------------------|
//! | `POST /auth`           | none          | token issue        |
//! | `POST /create`         | administrator | open + register    |
//! | `POST /<id>/push`      | editor        | `push`             |
//! | `GET /<id>/all`        | viewer        | `all`              |
//! | `POST /<id>/get`       | viewer        | `get`              |
//! | `POST /<id>/update`    | editor        | `update`           |
//! | `GET /<id>/delete?id=` | editor        | `delete`           |
//! | `GET /<id>/drop`       | administrator | `drop_collection`  |
//!
//! Request handling is transport independent ([`MoonlightServer::handle`]);
//! [`serve`] binds it to HTTP with axum.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod http;
mod server;
mod transport;

pub use config::{ServerConfig, DEFAULT_LOCK_TIMEOUT};
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler, MAX_COLLECTION_NAME};
pub use http::{Method, Request, Response, Route};
pub use server::MoonlightServer;
pub use transport::{into_request, router, serve, serve_on};
