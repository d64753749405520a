#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use passhash_api::config::ServerConfig;
use passhash_api::router::build_app_router;
use passhash_api::state::AppState;
use passhash_core::{HashParameters, ParameterPolicy, ServiceConfig};
use tower::ServiceExt;

/// Cheap Argon2id parameters so tests stay fast.
pub fn test_params() -> HashParameters {
    HashParameters::new(256, 1, 1, 16, 32).unwrap()
}

/// Build a test `ServerConfig` with safe defaults and `slots` hashing slots.
pub fn test_config(slots: usize) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        hashing: ServiceConfig {
            policy: ParameterPolicy::new(test_params(), 2048).unwrap(),
            slots,
            admission_timeout: Duration::from_millis(200),
            compute_timeout: None,
        },
    }
}

/// Build the state and the full router (same middleware stack as `main.rs`).
pub fn build_test_app_with_config(config: ServerConfig) -> (Router, AppState) {
    let state = AppState::new(config.clone());
    (build_app_router(state.clone(), &config), state)
}

pub fn build_test_app_with_state(slots: usize) -> (Router, AppState) {
    build_test_app_with_config(test_config(slots))
}

pub fn build_test_app() -> Router {
    build_test_app_with_state(4).0
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Hash `password` through the API and return the PHC string.
pub async fn hash_via_api(app: Router, password: &str) -> String {
    let response = post_json(
        app,
        "/hash_password",
        serde_json::json!({ "password": password }),
    )
    .await;
    assert_eq!(response.status(), 200);
    body_json(response).await["password_hash"]
        .as_str()
        .unwrap()
        .to_string()
}
