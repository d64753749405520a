//! Async hashing service: validation, admission, then blocking computation.
//!
//! This is the in-process interface transports call. Every request is
//! validated (and, for verification, decoded) before it asks for a slot, so
//! malformed input never waits in the queue or consumes memory-hard work.

use std::sync::Arc;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::admission::{self, AdmissionController, AdmissionStats};
use crate::engine;
use crate::error::HashError;
use crate::params::{HashParameters, ParameterPolicy, ParamsError};
use crate::phc::{self, DecodeError, EncodedHash};
use crate::verify;

/// Runtime knobs for [`HashingService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub policy: ParameterPolicy,
    /// Number of hashing slots, each worth the policy's memory cost.
    pub slots: usize,
    pub admission_timeout: Duration,
    /// Optional bound on a single computation. Exceeding it is an internal
    /// error; the computation itself keeps its slot until it finishes.
    pub compute_timeout: Option<Duration>,
}

impl ServiceConfig {
    /// Defaults with slots sized from [`admission::DEFAULT_MEMORY_BUDGET_KIB`].
    pub fn new(policy: ParameterPolicy) -> Self {
        let slots = admission::slots_for_budget(
            admission::DEFAULT_MEMORY_BUDGET_KIB,
            policy.current().memory_cost_kib,
        );
        Self {
            policy,
            slots,
            admission_timeout: admission::DEFAULT_ADMISSION_TIMEOUT,
            compute_timeout: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(ParameterPolicy::default())
    }
}

/// Outcome of a successful verification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub matched: bool,
    /// Set only when `matched` and the stored parameters differ from the
    /// current policy.
    pub needs_rehash: bool,
}

#[derive(Debug, Clone)]
pub struct HashingService {
    policy: Arc<ParameterPolicy>,
    admission: Arc<AdmissionController>,
    admission_timeout: Duration,
    compute_timeout: Option<Duration>,
}

impl HashingService {
    pub fn new(config: ServiceConfig) -> Self {
        tracing::info!(
            memory_cost_kib = config.policy.current().memory_cost_kib,
            iterations = config.policy.current().iterations,
            parallelism = config.policy.current().parallelism,
            slots = config.slots,
            admission_timeout_ms = config.admission_timeout.as_millis() as u64,
            "Hashing service configured"
        );
        let admission = Arc::new(AdmissionController::new(
            config.slots,
            config.policy.current().memory_cost_kib,
        ));
        Self {
            policy: Arc::new(config.policy),
            admission,
            admission_timeout: config.admission_timeout,
            compute_timeout: config.compute_timeout,
        }
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn stats(&self) -> AdmissionStats {
        self.admission.stats()
    }

    /// Hash a password under the current policy.
    pub async fn hash_password(&self, password: &[u8]) -> Result<EncodedHash, HashError> {
        self.policy.check_password(password)?;

        let params = self.policy.current();
        let ticket = self
            .admission
            .admit_memory(params.memory_cost_kib, self.admission_timeout)
            .await?;
        let password = Zeroizing::new(password.to_vec());

        self.run_admitted(move || {
            let _ticket = ticket;
            engine::hash(&password, &params)
        })
        .await
    }

    /// Verify a password against a stored PHC string.
    ///
    /// Preserves the check order of [`verify::verify`]; the length cap sits
    /// between the empty-input checks and decoding. A stored hash costing
    /// more than the policy allows, or more memory than the whole budget, is
    /// rejected as invalid before admission.
    pub async fn verify_password(
        &self,
        password: &[u8],
        stored_hash: &str,
    ) -> Result<Verification, HashError> {
        if password.is_empty() {
            return Err(HashError::EmptyPassword);
        }
        if stored_hash.is_empty() {
            return Err(HashError::EmptyHash);
        }
        self.policy.check_password(password)?;

        let decoded = phc::decode(stored_hash)
            .and_then(|decoded| {
                self.check_stored_cost(&decoded.params)
                    .map_err(DecodeError::Parameters)?;
                Ok(decoded)
            })
            .map_err(|e| {
                tracing::debug!(reason = %e, "Rejected stored hash");
                HashError::InvalidHash(e)
            })?;
        let stale = self.policy.needs_rehash(&decoded.params);

        let ticket = self
            .admission
            .admit_memory(decoded.params.memory_cost_kib, self.admission_timeout)
            .await?;
        let password = Zeroizing::new(password.to_vec());

        let matched = self
            .run_admitted(move || {
                let _ticket = ticket;
                verify::verify_decoded(&password, &decoded)
            })
            .await?;

        Ok(Verification {
            matched,
            needs_rehash: matched && stale,
        })
    }

    fn check_stored_cost(&self, stored: &HashParameters) -> Result<(), ParamsError> {
        self.policy.check_stored(stored)?;
        if !self.admission.fits_budget(stored.memory_cost_kib) {
            return Err(ParamsError::OutOfRange {
                field: "memory_cost_kib",
                value: u64::from(stored.memory_cost_kib),
            });
        }
        Ok(())
    }

    /// Run admitted work on the blocking pool.
    ///
    /// The ticket lives inside `work`, so the slot is held until the
    /// computation really ends even if the caller stops waiting.
    async fn run_admitted<T, F>(&self, work: F) -> Result<T, HashError>
    where
        F: FnOnce() -> Result<T, HashError> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);

        let joined = match self.compute_timeout {
            Some(limit) => tokio::time::timeout(limit, handle).await.map_err(|_| {
                tracing::error!(limit_ms = limit.as_millis() as u64, "Hash computation timed out");
                HashError::Internal(format!("hash computation exceeded {limit:?}"))
            })?,
            None => handle.await,
        };

        joined.map_err(|e| HashError::Internal(format!("hashing task failed: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
