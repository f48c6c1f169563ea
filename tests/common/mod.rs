//! Common test helpers for integration tests.
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use task_manager_api::api::{self, AppState};
use task_manager_api::infrastructure::InMemoryTaskRepository;

// =============================================================================
// Application Helpers
// =============================================================================

/// Creates a test `AppState` backed by in-memory storage.
pub fn create_test_app_state() -> AppState {
    AppState::new(Arc::new(InMemoryTaskRepository::new()))
}

/// Creates the full router over a fresh in-memory store.
pub fn create_test_router() -> Router {
    api::router(create_test_app_state())
}

/// Serves a fresh router on an ephemeral local port and returns its base URL.
pub async fn spawn_server() -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let address = listener.local_addr().unwrap();
    let application = create_test_router();

    tokio::spawn(async move {
        axum::serve(listener, application).await.unwrap();
    });

    format!("http://{address}")
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Sends one request through the router and returns status and JSON body.
///
/// An empty body is returned as `Value::Null`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

/// Sends a raw body with a JSON content type.
pub async fn send_raw(router: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Creates a task through the API and returns its id.
pub async fn create_task(router: &Router, body: Value) -> String {
    let (status, response) = send(router, Method::POST, "/api/tasks", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {response}");
    response["insertedId"].as_str().unwrap().to_string()
}
