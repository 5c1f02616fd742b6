//! Async server facade.

use crate::config::{ServerConfig, DEFAULT_LOCK_TIMEOUT};
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use crate::http::{Request, Response};
use moonlight_core::{Registry, StoreConfig};
use std::sync::Arc;
use tracing::{error, info};

/// The Moonlight server.
///
/// Requests are handled on tokio's blocking pool: collection operations
/// take file locks and read whole files, which must not stall the runtime.
///
/// # Example
///
/// ```rust,ignore
/// use moonlight_server::{MoonlightServer, Request};
/// use serde_json::json;
///
/// let server = MoonlightServer::open(StoreConfig::new("/srv/moon"))?;
/// let res = server
///     .handle(Request::post("/auth", json!({"username": "root", "password": "pw"})))
///     .await;
/// assert_eq!(res.status, 200);
/// ```
#[derive(Clone)]
pub struct MoonlightServer {
    handler: Arc<RequestHandler>,
    context: Arc<HandlerContext>,
}

impl MoonlightServer {
    /// Creates a server over an existing registry.
    pub fn new(config: ServerConfig, store: StoreConfig, registry: Arc<Registry>) -> Self {
        let context = Arc::new(HandlerContext::new(config, store, registry));
        let handler = Arc::new(RequestHandler::new(Arc::clone(&context)));
        Self { handler, context }
    }

    /// Opens the registry under `store`'s root and configures the server from
    /// it: bind address from host and port, collection log levels from the
    /// logging settings. Locks wait for `store`'s timeout, or
    /// [`DEFAULT_LOCK_TIMEOUT`](crate::DEFAULT_LOCK_TIMEOUT) when it has none.
    pub fn open(store: StoreConfig) -> ServerResult<Self> {
        let timeout = store.lock_timeout.unwrap_or(DEFAULT_LOCK_TIMEOUT);
        let registry = Arc::new(Registry::open_with_lock_timeout(
            &store.registry_path(),
            Some(timeout),
        )?);
        let app = registry.snapshot()?;
        let config = ServerConfig::from_app(&app)?.with_lock_timeout(timeout);
        let store = store.log_levels(app.effective_log_levels());
        Ok(Self::new(config, store, registry))
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.context.registry
    }

    /// Handles a request on the blocking pool.
    pub async fn handle(&self, request: Request) -> Response {
        let handler = Arc::clone(&self.handler);
        let method = request.method;
        let path = request.path.clone();

        let result = tokio::task::spawn_blocking(move || handler.handle(&request))
            .await
            .unwrap_or_else(|e| Err(ServerError::Internal(format!("handler task failed: {e}"))));

        render(method, &path, result)
    }

    /// Handles a request on the current thread.
    pub fn handle_blocking(&self, request: &Request) -> Response {
        render(request.method, &request.path, self.handler.handle(request))
    }
}

fn render(method: crate::http::Method, path: &str, result: ServerResult<Response>) -> Response {
    match result {
        Ok(response) => {
            info!(%method, path, status = response.status, "request handled");
            response
        }
        Err(e) if e.is_server_error() => {
            error!(%method, path, status = e.status(), error = %e, "request failed");
            Response::error(&e)
        }
        Err(e) => {
            info!(%method, path, status = e.status(), error = %e, "request rejected");
            Response::error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonlight_core::Permission;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn server_lifecycle() {
        let temp = tempdir().unwrap();
        let server = MoonlightServer::open(StoreConfig::new(temp.path())).unwrap();
        assert_eq!(server.config().bind_addr.port(), 3000);

        server
            .registry()
            .create_user("root", "secret", Permission::Administrator)
            .unwrap();

        let res = server
            .handle(Request::post(
                "/auth",
                json!({"username": "root", "password": "secret"}),
            ))
            .await;
        assert_eq!(res.status, 200);
        let token = res.body["data"]["token"].as_str().unwrap().to_string();

        let res = server
            .handle(Request::post("/create", json!({"name": "users"})).with_token(&token))
            .await;
        assert_eq!(res.status, 201);
        let id = res.body["data"]["id"].as_i64().unwrap();

        let res = server
            .handle(Request::post(format!("/{id}/push"), json!({"n": 1})).with_token(&token))
            .await;
        assert_eq!(res.status, 201);

        let res = server
            .handle(Request::get(format!("/{id}/all")).with_token(&token))
            .await;
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn open_bounds_every_lock() {
        let temp = tempdir().unwrap();
        let server = MoonlightServer::open(StoreConfig::new(temp.path())).unwrap();
        assert_eq!(server.config().lock_timeout, DEFAULT_LOCK_TIMEOUT);
        assert_eq!(server.context.store.lock_timeout, Some(DEFAULT_LOCK_TIMEOUT));
        assert_eq!(server.registry().lock_timeout(), Some(DEFAULT_LOCK_TIMEOUT));

        let short = std::time::Duration::from_millis(40);
        let server =
            MoonlightServer::open(StoreConfig::new(temp.path()).lock_timeout(short)).unwrap();
        assert_eq!(server.config().lock_timeout, short);
        assert_eq!(server.registry().lock_timeout(), Some(short));
    }

    #[tokio::test]
    async fn errors_render_envelopes() {
        let temp = tempdir().unwrap();
        let server = MoonlightServer::open(StoreConfig::new(temp.path())).unwrap();

        let res = server.handle(Request::get("/1/all")).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["error"], "unauthorized");
        assert!(res.body["message"].is_string());

        let res = server.handle_blocking(&Request::get("/missing"));
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn concurrent_pushes() {
        let temp = tempdir().unwrap();
        let server = MoonlightServer::open(StoreConfig::new(temp.path())).unwrap();
        server
            .registry()
            .create_user("root", "secret", Permission::Administrator)
            .unwrap();
        let token = server
            .registry()
            .create_token("root", moonlight_core::default_token_ttl())
            .unwrap()
            .token;

        let res = server
            .handle(Request::post("/create", json!({"name": "events"})).with_token(&token))
            .await;
        let id = res.body["data"]["id"].as_i64().unwrap();

        let mut tasks = Vec::new();
        for n in 0..16 {
            let server = server.clone();
            let token = token.clone();
            tasks.push(tokio::spawn(async move {
                server
                    .handle(Request::post(format!("/{id}/push"), json!({ "n": n })).with_token(token))
                    .await
                    .status
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), 201);
        }

        let res = server
            .handle(Request::get(format!("/{id}/all")).with_token(&token))
            .await;
        assert_eq!(res.body["data"].as_array().unwrap().len(), 16);
    }
}
