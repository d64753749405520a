use std::sync::Arc;

use passhash_core::HashingService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Argon2id hashing service with its admission budget.
    pub hasher: Arc<HashingService>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let hasher = Arc::new(HashingService::new(config.hashing.clone()));
        Self {
            hasher,
            config: Arc::new(config),
        }
    }
}
