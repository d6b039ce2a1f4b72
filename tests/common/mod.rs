//! Common test helpers for integration tests.
//!
//! This module provides shared utilities for building the application
//! router over an in-memory repository and driving it with requests.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::{create_test_router, send_json};
//! ```
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, and not every file uses every helper.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

use task_tracker::api::{AppState, cors_layer, router};
use task_tracker::infrastructure::InMemoryTaskRepository;

/// Origin admitted by the test CORS policy.
pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";

// =============================================================================
// App Helpers
// =============================================================================

/// Creates a test `AppState` with an empty in-memory repository.
pub fn create_test_app_state() -> AppState {
    AppState::new(Arc::new(InMemoryTaskRepository::new()))
}

/// Creates the full application router over `state`.
pub fn create_router(state: AppState) -> Router {
    router(state, cors_layer(&[ALLOWED_ORIGIN]))
}

/// Creates the full application router over a fresh in-memory repository.
pub fn create_test_router() -> Router {
    create_router(create_test_app_state())
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Response parts collected from a oneshot call.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|error| {
            panic!(
                "body is not the expected JSON ({error}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    /// Error `code` of a JSON error body.
    pub fn error_code(&self) -> String {
        self.json::<Value>()["code"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// Sends a request through a clone of the router.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Sends a request with a JSON body.
pub async fn send_json(app: &Router, method: Method, uri: &str, body: &Value) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Sends a request with a raw body, for malformed-input cases.
pub async fn send_raw(app: &Router, method: Method, uri: &str, body: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Sends a bodiless request.
pub async fn send_empty(app: &Router, method: Method, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Creates a task through the API and returns the response body.
pub async fn create_task(app: &Router, body: Value) -> Value {
    let response = send_json(app, Method::POST, "/api/tasks", &body).await;
    assert_eq!(response.status, StatusCode::CREATED, "create failed: {body}");
    response.json()
}
