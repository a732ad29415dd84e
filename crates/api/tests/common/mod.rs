#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use inventra_api::config::{HttpConfig, ServerConfig, SessionConfig};
use inventra_api::router::build_app_router;
use inventra_api::state::AppState;
use inventra_core::config::ImportConfig;
use inventra_import::{EntityStore, MemoryStore};

/// Development defaults, bound to an unused port.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        http: HttpConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..HttpConfig::default()
        },
        sessions: SessionConfig::default(),
        import: ImportConfig::default(),
        shutdown_timeout: Duration::from_secs(5),
    }
}

/// Build the full application router over an in-memory store.
///
/// The router owns the session registry, so tests clone it for every
/// request of a scenario instead of rebuilding it.
pub fn build_test_app(store: Arc<MemoryStore>) -> Router {
    build_test_app_with(store)
}

/// Same as [`build_test_app`] for any store implementation.
pub fn build_test_app_with(store: Arc<dyn EntityStore>) -> Router {
    let config = test_config();
    let state = AppState::new(store, &config);
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::post(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a single file as `multipart/form-data`.
pub async fn post_file(
    app: Router,
    uri: &str,
    filename: &str,
    content_type: &str,
    contents: &str,
) -> Response<Body> {
    let boundary = "inventra-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n\
         {contents}\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::post(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
