//! Transport-independent request and response types.

use crate::error::{ServerError, ServerResult};
use moonlight_core::Permission;
use serde_json::{json, Value};
use std::fmt;

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// Parses a method name. Only `GET` and `POST` are served.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// An incoming request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Method.
    pub method: Method,
    /// Path, without the query string.
    pub path: String,
    /// Decoded query parameters.
    pub query: Vec<(String, String)>,
    /// Value of the `Authorization` header.
    pub token: Option<String>,
    /// JSON body, `Null` when absent.
    pub body: Value,
}

impl Request {
    /// Creates a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            token: None,
            body: Value::Null,
        }
    }

    /// Creates a `POST` request with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            body,
            ..Self::get(path)
        }
    }

    /// Sets the `Authorization` token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Returns the first value of query parameter `key`.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// An outgoing response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Value,
}

impl Response {
    /// Success envelope `{data}`.
    pub fn data(status: u16, data: Value) -> Self {
        Self {
            status,
            body: json!({ "data": data }),
        }
    }

    /// `200 OK` with `{data}`.
    pub fn ok(data: Value) -> Self {
        Self::data(200, data)
    }

    /// `201 Created` with `{data}`.
    pub fn created(data: Value) -> Self {
        Self::data(201, data)
    }

    /// Error envelope for `error`.
    pub fn error(error: &ServerError) -> Self {
        Self {
            status: error.status(),
            body: error.body(),
        }
    }

    /// Returns true for 2xx responses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A served endpoint. Collection routes carry the catalog id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `POST /auth`
    Auth,
    /// `POST /create`
    Create,
    /// `POST /<id>/push`
    Push(i64),
    /// `GET /<id>/all`
    All(i64),
    /// `POST /<id>/get`
    Get(i64),
    /// `POST /<id>/update`
    Update(i64),
    /// `GET /<id>/delete?id=`
    Delete(i64),
    /// `GET /<id>/drop`
    Drop(i64),
}

impl Route {
    /// Matches a method and path.
    pub fn resolve(method: Method, path: &str) -> ServerResult<Self> {
        let not_found = || ServerError::RouteNotFound {
            method: method.to_string(),
            path: path.to_string(),
        };

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let route = match (method, segments.as_slice()) {
            (Method::Post, ["auth"]) => Route::Auth,
            (Method::Post, ["create"]) => Route::Create,
            (method, [id, action]) => {
                let id: i64 = id.parse().map_err(|_| not_found())?;
                match (method, *action) {
                    (Method::Post, "push") => Route::Push(id),
                    (Method::Get, "all") => Route::All(id),
                    (Method::Post, "get") => Route::Get(id),
                    (Method::Post, "update") => Route::Update(id),
                    (Method::Get, "delete") => Route::Delete(id),
                    (Method::Get, "drop") => Route::Drop(id),
                    _ => return Err(not_found()),
                }
            }
            _ => return Err(not_found()),
        };
        Ok(route)
    }

    /// Minimal permission, or `None` for the unauthenticated route.
    pub fn permission(&self) -> Option<Permission> {
        match self {
            Route::Auth => None,
            Route::All(_) | Route::Get(_) => Some(Permission::Viewer),
            Route::Push(_) | Route::Update(_) | Route::Delete(_) => Some(Permission::Editor),
            Route::Create | Route::Drop(_) => Some(Permission::Administrator),
        }
    }

    /// Catalog id of the target collection.
    pub fn collection(&self) -> Option<i64> {
        match *self {
            Route::Auth | Route::Create => None,
            Route::Push(id)
            | Route::All(id)
            | Route::Get(id)
            | Route::Update(id)
            | Route::Delete(id)
            | Route::Drop(id) => Some(id),
        }
    }
}
