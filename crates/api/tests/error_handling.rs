//! Tests for `AppError` -> HTTP response mapping.
//!
//! These call `IntoResponse` directly; no server or hashing involved.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use passhash_api::error::AppError;
use passhash_core::phc::{self, DecodeError};
use passhash_core::HashError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn validation_errors_return_400_with_stable_codes() {
    let cases = [
        (HashError::EmptyPassword, "empty_password"),
        (HashError::EmptyHash, "empty_hash"),
        (HashError::PasswordTooLong { max: 2048 }, "password_too_long"),
        (HashError::InvalidHash(DecodeError::Algorithm), "invalid_hash"),
    ];

    for (err, code) in cases {
        let (status, json) = error_to_response(AppError::Hash(err)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], code);
    }
}

#[tokio::test]
async fn invalid_hash_does_not_reveal_failing_segment() {
    let reason = phc::decode("$argon2id$v=19$m=256,t=1,p=1$!!!$AAAA").unwrap_err();
    assert_matches!(reason, DecodeError::Salt);

    let (_, json) = error_to_response(AppError::Hash(HashError::InvalidHash(reason))).await;
    let body = json.to_string();
    assert!(!body.contains("salt"), "body leaked decode detail: {body}");
}

#[tokio::test]
async fn busy_returns_503() {
    let (status, json) = error_to_response(AppError::Hash(HashError::Busy)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "busy");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::Hash(HashError::Internal(
        "cannot allocate 19456 argon2 memory blocks".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal_error");
    assert_eq!(json["message"], "An internal error occurred");
    assert!(!json.to_string().contains("allocate"));
}

#[tokio::test]
async fn bad_request_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("EOF while parsing".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn payload_too_large_returns_413() {
    let (status, json) = error_to_response(AppError::PayloadTooLarge).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"], "payload_too_large");
}
