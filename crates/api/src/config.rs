use std::time::Duration;

use passhash_core::admission;
use passhash_core::params::{self, HashParameters, ParameterPolicy};
use passhash_core::ServiceConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Hashing policy, slot count, and timeouts.
    pub hashing: ServiceConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `HASH_MEMORY_KIB`           | `19456`                 |
    /// | `HASH_ITERATIONS`           | `2`                     |
    /// | `HASH_PARALLELISM`          | `1`                     |
    /// | `HASH_SALT_LEN`             | `16`                    |
    /// | `HASH_OUTPUT_LEN`           | `32`                    |
    /// | `HASH_MAX_PASSWORD_BYTES`   | `2048`                  |
    /// | `HASH_MAX_COST_FACTOR`      | `4`                     |
    /// | `HASH_MEMORY_BUDGET_MIB`    | `512`                   |
    /// | `HASH_MAX_CONCURRENT`       | derived from budget     |
    /// | `HASH_ADMISSION_TIMEOUT_MS` | `2000`                  |
    /// | `HASH_COMPUTE_TIMEOUT_MS`   | `0` (disabled)          |
    ///
    /// Each slot is worth `HASH_MEMORY_KIB`, so setting `HASH_MAX_CONCURRENT`
    /// makes the budget `HASH_MAX_CONCURRENT x HASH_MEMORY_KIB`.
    ///
    /// Panics on malformed values or an invalid Argon2 parameter set; a
    /// misconfigured hasher must not start.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_parse("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", 30);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            hashing: hashing_from_env(),
        }
    }
}

fn hashing_from_env() -> ServiceConfig {
    let hash_params = HashParameters::new(
        env_parse("HASH_MEMORY_KIB", params::DEFAULT_MEMORY_COST_KIB),
        env_parse("HASH_ITERATIONS", params::DEFAULT_ITERATIONS),
        env_parse("HASH_PARALLELISM", params::DEFAULT_PARALLELISM),
        env_parse("HASH_SALT_LEN", params::DEFAULT_SALT_LEN),
        env_parse("HASH_OUTPUT_LEN", params::DEFAULT_OUTPUT_LEN),
    )
    .unwrap_or_else(|e| panic!("Invalid Argon2 parameters: {e}"));

    let policy = ParameterPolicy::new(
        hash_params,
        env_parse("HASH_MAX_PASSWORD_BYTES", params::DEFAULT_MAX_PASSWORD_BYTES),
    )
    .and_then(|policy| {
        policy.with_max_cost_factor(env_parse(
            "HASH_MAX_COST_FACTOR",
            params::DEFAULT_MAX_COST_FACTOR,
        ))
    })
    .unwrap_or_else(|e| panic!("Invalid hashing policy: {e}"));

    let budget_mib: u64 = env_parse(
        "HASH_MEMORY_BUDGET_MIB",
        admission::DEFAULT_MEMORY_BUDGET_KIB / 1024,
    );
    let slots = match std::env::var("HASH_MAX_CONCURRENT") {
        Ok(raw) => raw
            .parse()
            .expect("HASH_MAX_CONCURRENT must be a valid usize"),
        Err(_) => admission::slots_for_budget(budget_mib * 1024, hash_params.memory_cost_kib),
    };

    let admission_timeout = Duration::from_millis(env_parse(
        "HASH_ADMISSION_TIMEOUT_MS",
        admission::DEFAULT_ADMISSION_TIMEOUT.as_millis() as u64,
    ));

    let compute_timeout_ms: u64 = env_parse("HASH_COMPUTE_TIMEOUT_MS", 0);
    let compute_timeout = (compute_timeout_ms > 0).then(|| Duration::from_millis(compute_timeout_ms));

    ServiceConfig {
        policy,
        slots,
        admission_timeout,
        compute_timeout,
    }
}

/// Read and parse an env var, falling back to `default` when unset.
fn env_parse<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} is invalid: {e}")),
        Err(_) => default,
    }
}
