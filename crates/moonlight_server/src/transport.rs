//! HTTP binding over axum.
//!
//! Every path goes to one fallback handler that converts the axum request
//! into a [`Request`] and hands it to [`MoonlightServer::handle`]; routing
//! stays in [`Route`](crate::Route).

use crate::error::{ServerError, ServerResult};
use crate::http::{Method, Request, Response};
use crate::server::MoonlightServer;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;

/// Builds the router for `server`.
pub fn router(server: MoonlightServer) -> Router {
    Router::new().fallback(dispatch).with_state(server)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(server: MoonlightServer) -> ServerResult<()> {
    let listener = TcpListener::bind(server.config().bind_addr).await?;
    serve_on(listener, server).await
}

/// Serves on an already bound listener until Ctrl-C.
pub async fn serve_on(listener: TcpListener, server: MoonlightServer) -> ServerResult<()> {
    info!(addr = %listener.local_addr()?, "moonlight listening");
    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("moonlight stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler: run until the process is killed.
        std::future::pending::<()>().await;
    }
}

async fn dispatch(
    State(server): State<MoonlightServer>,
    method: axum::http::Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> axum::response::Response {
    let response = match into_request(&method, &uri, &headers, query, &body) {
        Ok(request) => server.handle(request).await,
        Err(e) => Response::error(&e),
    };
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

/// Converts HTTP parts into a [`Request`].
///
/// An empty body becomes `null`. The token is the raw `Authorization`
/// header, with an optional `Bearer ` prefix removed.
pub fn into_request(
    method: &axum::http::Method,
    uri: &Uri,
    headers: &HeaderMap,
    query: Vec<(String, String)>,
    body: &[u8],
) -> ServerResult<Request> {
    let path = uri.path().to_string();
    let method = Method::parse(method.as_str()).ok_or_else(|| ServerError::RouteNotFound {
        method: method.to_string(),
        path: path.clone(),
    })?;

    let body = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ServerError::InvalidRequest(format!("body is not valid JSON: {e}")))?
    };

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).to_string());

    Ok(Request {
        method,
        path,
        query,
        token,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use moonlight_core::StoreConfig;
    use serde_json::json;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn converts_parts() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let uri: Uri = "/7/delete?id=5".parse().unwrap();

        let req = into_request(
            &axum::http::Method::GET,
            &uri,
            &headers,
            vec![("id".into(), "5".into())],
            b"",
        )
        .unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, "/7/delete");
        assert_eq!(req.token.as_deref(), Some("abc"));
        assert_eq!(req.query_param("id"), Some("5"));
        assert_eq!(req.body, Value::Null);
    }

    #[test]
    fn rejects_bad_bodies_and_methods() {
        let uri: Uri = "/auth".parse().unwrap();
        let headers = HeaderMap::new();

        let err = into_request(&axum::http::Method::POST, &uri, &headers, vec![], b"{oops")
            .unwrap_err();
        assert_eq!(err.status(), 400);

        let err = into_request(&axum::http::Method::PUT, &uri, &headers, vec![], b"")
            .unwrap_err();
        assert_eq!(err.status(), 404);

        let req = into_request(
            &axum::http::Method::POST,
            &uri,
            &headers,
            vec![],
            br#"{"username": "a"}"#,
        )
        .unwrap();
        assert_eq!(req.body, json!({"username": "a"}));
    }

    #[tokio::test]
    async fn serves_over_tcp() {
        let temp = tempdir().unwrap();
        let server = MoonlightServer::open(StoreConfig::new(temp.path())).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(serve_on(listener, server));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /1/all HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 401"), "{raw}");
        assert!(raw.contains("unauthorized"));
        task.abort();
    }
}
