//! Request handling.
//!
//! Every request runs the same chain: resolve the route, authenticate the
//! token, check the route's minimal permission, validate the body, then
//! dispatch to exactly one engine call. Handlers are synchronous; the
//! [`MoonlightServer`](crate::MoonlightServer) facade moves them off the
//! async runtime.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::http::{Request, Response, Route};
use chrono::Utc;
use moonlight_core::{
    required_fields, CollectionCatalog, CollectionInfo, FieldSpec, Permission, RecordId, Registry,
    Rule, Schema, Store, StoreConfig, User,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Longest collection name accepted by `/create`.
pub const MAX_COLLECTION_NAME: usize = 200;

fn create_schema() -> Schema {
    Schema::new().field(
        FieldSpec::new("name")
            .rule(Rule::Required)
            .rule(Rule::MaxLength(MAX_COLLECTION_NAME)),
    )
}

/// State shared by all requests.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Settings used to open collections.
    pub store: StoreConfig,
    /// Users, tokens and the collection catalog.
    pub registry: Arc<Registry>,
}

impl HandlerContext {
    /// Creates a new handler context.
    ///
    /// Collections opened without a lock timeout of their own wait at most
    /// `config.lock_timeout`.
    pub fn new(config: ServerConfig, mut store: StoreConfig, registry: Arc<Registry>) -> Self {
        store.lock_timeout = store.lock_timeout.or(Some(config.lock_timeout));
        Self {
            config,
            store,
            registry,
        }
    }

    fn open(&self, name: &str, author: &str) -> ServerResult<Store> {
        let catalog: Arc<dyn CollectionCatalog> = Arc::clone(&self.registry) as _;
        Ok(Store::open_with_catalog(name, &self.store, catalog, author)?)
    }

    fn collection(&self, id: i64) -> ServerResult<CollectionInfo> {
        self.registry
            .collection_by_id(id)?
            .ok_or(ServerError::UnknownCollection(id))
    }
}

/// Runs requests through the authentication and dispatch chain.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles one request. Errors are returned for the caller to render.
    pub fn handle(&self, request: &Request) -> ServerResult<Response> {
        let route = Route::resolve(request.method, &request.path)?;

        let user = match route.permission() {
            None => None,
            Some(required) => {
                let user = self.authenticate(request)?;
                authorize(&user, required)?;
                Some(user)
            }
        };

        match (route, user) {
            (Route::Auth, _) => self.handle_auth(&request.body),
            (Route::Create, Some(user)) => self.handle_create(&user, &request.body),
            (route, Some(user)) => self.handle_collection(route, &user, request),
            (_, None) => Err(ServerError::Internal("route requires a user".into())),
        }
    }

    fn authenticate(&self, request: &Request) -> ServerResult<User> {
        let token = request
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServerError::AuthenticationFailed("missing token".into()))?;

        self.context
            .registry
            .user_for_token(token, Utc::now())?
            .ok_or_else(|| ServerError::AuthenticationFailed("invalid or expired token".into()))
    }

    fn handle_auth(&self, body: &Value) -> ServerResult<Response> {
        require(body, &["username", "password"])?;
        let username = string_field(body, "username")?;
        let password = string_field(body, "password")?;

        let registry = &self.context.registry;
        if registry.authenticate(username, password)?.is_none() {
            return Err(ServerError::AuthenticationFailed("invalid credentials".into()));
        }

        let key = registry.create_token(username, self.context.config.token_ttl)?;
        debug!(username, "token issued");
        Ok(Response::ok(json!({
            "token": key.token,
            "expires": key.expires.to_rfc3339(),
        })))
    }

    fn handle_create(&self, user: &User, body: &Value) -> ServerResult<Response> {
        require(body, &["name"])?;
        let body = Value::Object(
            create_schema()
                .validate(body)
                .map_err(|e| ServerError::InvalidRequest(e.to_string()))?,
        );
        let name = string_field(&body, "name")?;
        let paths = self.context.store.resolver().resolve(name)?;

        // Check and insert under one registry lock so racing creates see
        // exactly one winner.
        let registry = &self.context.registry;
        let timeout = self.context.store.lock_timeout;
        let Some(info) = registry.register(&paths, &user.username, timeout)? else {
            let existing = registry.collection_by_name(&paths.name)?.ok_or_else(|| {
                ServerError::Internal(format!("`{}` vanished during create", paths.name))
            })?;
            return Err(ServerError::CollectionExists {
                name: existing.name,
                id: existing.id,
            });
        };

        self.context.open(&info.name, &user.username)?;
        Ok(Response::created(json!({ "id": info.id })))
    }

    fn handle_collection(&self, route: Route, user: &User, request: &Request) -> ServerResult<Response> {
        let id = route
            .collection()
            .ok_or_else(|| ServerError::Internal("route has no collection".into()))?;
        let info = self.context.collection(id)?;
        let store = self.context.open(&info.name, &user.username)?;

        match route {
            Route::Push(_) => {
                let id = store.push(request.body.clone())?;
                Ok(Response::created(json!({ "id": id })))
            }
            Route::All(_) => Ok(Response::ok(records(store.all()?))),
            Route::Get(_) => Ok(Response::ok(records(store.get(&request.body)?))),
            Route::Update(_) => {
                let id = store.update(request.body.clone())?;
                Ok(Response::ok(json!({ "id": id })))
            }
            Route::Delete(_) => {
                let raw = request
                    .query_param("id")
                    .ok_or_else(|| ServerError::InvalidRequest("query parameter `id` required".into()))?;
                let id: RecordId = raw
                    .parse()
                    .map_err(|_| ServerError::InvalidRequest(format!("invalid id `{raw}`")))?;
                let record = store.delete(id)?;
                Ok(Response::ok(Value::Object(record)))
            }
            Route::Drop(_) => {
                store.drop_collection()?;
                Ok(Response::ok(json!({ "id": info.id, "name": info.name })))
            }
            Route::Auth | Route::Create => Err(ServerError::Internal("not a collection route".into())),
        }
    }
}

fn authorize(user: &User, required: Permission) -> ServerResult<()> {
    if user.permissions.allows(required) {
        Ok(())
    } else {
        Err(ServerError::PermissionDenied { required })
    }
}

fn require(body: &Value, fields: &[&str]) -> ServerResult<()> {
    let report = required_fields(body, fields);
    if report.is_ok() {
        Ok(())
    } else {
        Err(ServerError::MissingFields {
            missing: report.missing,
            empty: report.empty,
        })
    }
}

fn string_field<'a>(body: &'a Value, field: &str) -> ServerResult<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ServerError::InvalidRequest(format!("`{field}` must be a string")))
}

fn records(records: Vec<moonlight_core::Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}
