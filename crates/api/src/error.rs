use axum::extract::rejection::JsonRejection;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use passhash_core::{ErrorClass, HashError};
use serde_json::json;

/// Seconds suggested to overloaded callers before retrying.
const RETRY_AFTER_SECS: &str = "1";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`HashError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses
/// of the form `{ "error": <code>, "message": <text> }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A hashing-core error.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A request body that could not be read as the expected JSON.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A request body over the router's size limit.
    #[error("Request body too large")]
    PayloadTooLarge,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        AppError::BadRequest(rejection.body_text())
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Hash(err) => match err.class() {
                ErrorClass::Validation => (StatusCode::BAD_REQUEST, err.code(), err.to_string()),
                ErrorClass::Overload => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    err.code(),
                    err.to_string(),
                ),
                ErrorClass::Internal => {
                    tracing::error!(error = %err, "Internal hashing error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        err.code(),
                        "An internal error occurred".to_string(),
                    )
                }
            },
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                self.to_string(),
            ),
        };

        let body = json!({
            "error": code,
            "message": message,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response.headers_mut().insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}
