//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use user_service_lib::config::UserServiceConfig;
use user_service_lib::infra::Database;
use user_service_lib::routes::create_router;
use user_service_lib::state::AppState;

/// Seeded role ids, in seeding order
pub const ADMINISTRATOR: i32 = 1;
pub const EDITOR: i32 = 2;
pub const AUTHOR: i32 = 3;
pub const SUBSCRIBER: i32 = 4;

/// Fresh in-memory database with migrations applied and roles seeded.
pub async fn setup_state(config: UserServiceConfig) -> AppState {
    let db = Database::connect(&config.database)
        .await
        .expect("in-memory database");
    let state = AppState::new(db, config);
    state
        .role_service
        .seed_defaults()
        .await
        .expect("seed roles");
    state
}

/// Router over a fresh database with the token check disabled.
pub async fn setup_app() -> (Router, AppState) {
    let state = setup_state(UserServiceConfig::for_tests()).await;
    (create_router(state.clone()), state)
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send a request and decode the JSON body (`Null` when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn user_payload(name: &str, email: &str, roles: &[i32]) -> Value {
    serde_json::json!({
        "full_name": name,
        "email": email,
        "password": "password123",
        "roles": roles,
    })
}
