#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use dealflow_api::config::ServerConfig;
use dealflow_api::router::build_app_router;
use dealflow_api::state::AppState;
use dealflow_automation::{EngineConfig, PgAutomationStore, StatusHistoryTracker, WorkflowEngine};
use dealflow_notify::LogMailer;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the full application router, with the same middleware stack as
/// the binary, over the given pool. Mail goes to the log.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let store = Arc::new(PgAutomationStore::new(pool.clone()));
    let engine = WorkflowEngine::new(store.clone(), Arc::new(LogMailer), EngineConfig::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        engine: Arc::new(engine),
        tracker: Arc::new(StatusHistoryTracker::new(store)),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(json)).await
}

pub async fn put_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(json)).await
}

pub async fn patch_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(json)).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Id of a seeded status by name.
pub async fn status_id(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("SELECT id FROM statuses WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}
