use axum::extract::State;
use axum::{routing::get, Json, Router};
use passhash_core::admission::AdmissionStats;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `saturated` when every hashing slot is taken.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Admission slot usage.
    pub admission: AdmissionStats,
}

/// GET /health -- returns service health and hashing capacity.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let admission = state.hasher.stats();

    let status = if admission.slots_available == 0 {
        "saturated"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        admission,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
