//! Route definitions for the hashing operations.

use axum::routing::post;
use axum::Router;

use super::not_found;
use crate::handlers::password;
use crate::state::AppState;

/// Hashing routes, mounted at the root.
///
/// ```text
/// POST /hash_password    -> hash_password
/// POST /verify_password  -> verify_password
/// ```
///
/// Any other method on these paths answers 404.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/hash_password",
            post(password::hash_password).fallback(not_found),
        )
        .route(
            "/verify_password",
            post(password::verify_password).fallback(not_found),
        )
}
