pub mod health;
pub mod password;

use axum::http::StatusCode;

/// Answer for paths that exist but not for the requested method.
async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
