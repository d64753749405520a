//! Handlers for the two hashing operations.
//!
//! Request types skip `Debug` so plaintext passwords cannot end up in logs
//! through a stray `{:?}`, and hold them in `Zeroizing` so the buffers are
//! wiped when the request is dropped.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::AppResult;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /hash_password`.
///
/// A missing `password` is treated as empty and rejected with
/// `empty_password`.
#[derive(Deserialize)]
pub struct HashPasswordRequest {
    #[serde(default = "empty_secret")]
    pub password: Zeroizing<String>,
}

#[derive(Debug, Serialize)]
pub struct HashPasswordResponse {
    /// PHC-encoded Argon2id hash for the caller to store.
    pub password_hash: String,
}

/// Request body for `POST /verify_password`.
#[derive(Deserialize)]
pub struct VerifyPasswordRequest {
    #[serde(default = "empty_secret")]
    pub password: Zeroizing<String>,
    #[serde(default)]
    pub hash: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPasswordResponse {
    pub ok: bool,
    /// True when `ok` and the stored hash predates the current parameters.
    pub needs_rehash: bool,
}

fn empty_secret() -> Zeroizing<String> {
    Zeroizing::new(String::new())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /hash_password
pub async fn hash_password(
    State(state): State<AppState>,
    payload: Result<Json<HashPasswordRequest>, JsonRejection>,
) -> AppResult<Json<HashPasswordResponse>> {
    let Json(input) = payload?;

    let encoded = state.hasher.hash_password(input.password.as_bytes()).await?;

    Ok(Json(HashPasswordResponse {
        password_hash: encoded.into_string(),
    }))
}

/// POST /verify_password
///
/// A wrong password is a successful call with `ok: false`.
pub async fn verify_password(
    State(state): State<AppState>,
    payload: Result<Json<VerifyPasswordRequest>, JsonRejection>,
) -> AppResult<Json<VerifyPasswordResponse>> {
    let Json(input) = payload?;

    let outcome = state
        .hasher
        .verify_password(input.password.as_bytes(), &input.hash)
        .await?;

    if outcome.needs_rehash {
        tracing::debug!("Verified hash uses outdated parameters");
    }

    Ok(Json(VerifyPasswordResponse {
        ok: outcome.matched,
        needs_rehash: outcome.needs_rehash,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_read_as_empty() {
        let hash: HashPasswordRequest = serde_json::from_str("{}").unwrap();
        assert!(hash.password.is_empty());

        let verify: VerifyPasswordRequest = serde_json::from_str(r#"{"hash":"$argon2id$"}"#).unwrap();
        assert!(verify.password.is_empty());
        assert_eq!(verify.hash, "$argon2id$");
    }

    #[test]
    fn password_is_held_in_zeroizing_buffer() {
        let request: VerifyPasswordRequest =
            serde_json::from_str(r#"{"password":"my-secret","hash":"h"}"#).unwrap();
        let password: &Zeroizing<String> = &request.password;
        assert_eq!(password.as_str(), "my-secret");
    }
}
