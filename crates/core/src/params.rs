//! Argon2id cost parameters and the process-wide hashing policy.
//!
//! [`HashParameters`] describe a single hash and are embedded in every
//! encoded hash, so changing the [`ParameterPolicy`] never invalidates stored
//! credentials: verification always uses the parameters found in the stored
//! string.

use serde::Serialize;

use crate::error::HashError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Argon2 version 1.0 (`v=16`). Accepted on decode for legacy hashes.
pub const VERSION_0X10: u32 = 0x10;

/// Argon2 version 1.3 (`v=19`). Used for every new hash.
pub const VERSION_0X13: u32 = 0x13;

/// Default memory cost: 19 MiB.
pub const DEFAULT_MEMORY_COST_KIB: u32 = 19 * 1024;

pub const DEFAULT_ITERATIONS: u32 = 2;

pub const DEFAULT_PARALLELISM: u32 = 1;

/// Default salt length in bytes (128 bits).
pub const DEFAULT_SALT_LEN: usize = 16;

/// Default digest length in bytes (256 bits).
pub const DEFAULT_OUTPUT_LEN: usize = 32;

/// Longest password accepted by default.
pub const DEFAULT_MAX_PASSWORD_BYTES: usize = 2048;

pub const MIN_SALT_LEN: usize = 8;
pub const MAX_SALT_LEN: usize = 64;

pub const MIN_OUTPUT_LEN: usize = 4;
pub const MAX_OUTPUT_LEN: usize = 64;

/// Upper bound on memory cost (1 GiB). A stored hash above this is treated
/// as malformed so a crafted string cannot demand unbounded memory.
pub const MAX_MEMORY_COST_KIB: u32 = 1024 * 1024;

/// Upper bound on iterations, for the same reason.
pub const MAX_ITERATIONS: u32 = 1024;

/// Argon2 lane limit (2^24 - 1).
pub const MAX_PARALLELISM: u32 = 0x00FF_FFFF;

/// How many times the current policy's `m x t` a stored hash may cost before
/// it is refused for verification.
pub const DEFAULT_MAX_COST_FACTOR: u32 = 4;

// ---------------------------------------------------------------------------
// HashParameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("memory cost {memory_cost_kib} KiB is below 8 x parallelism ({parallelism})")]
    MemoryBelowLanes { memory_cost_kib: u32, parallelism: u32 },

    #[error("{field} = {value} is outside the supported range")]
    OutOfRange { field: &'static str, value: u64 },

    #[error("unsupported argon2 version {0}")]
    UnsupportedVersion(u32),

    #[error("cost {cost} (m x t) exceeds the accepted ceiling {limit}")]
    CostAbovePolicy { cost: u64, limit: u64 },
}

/// Argon2id cost parameters for one hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HashParameters {
    pub memory_cost_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub salt_len: usize,
    pub output_len: usize,
    pub version: u32,
}

impl HashParameters {
    /// Build and validate a parameter set for the current Argon2 version.
    pub fn new(
        memory_cost_kib: u32,
        iterations: u32,
        parallelism: u32,
        salt_len: usize,
        output_len: usize,
    ) -> Result<Self, ParamsError> {
        let params = Self {
            memory_cost_kib,
            iterations,
            parallelism,
            salt_len,
            output_len,
            version: VERSION_0X13,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check every invariant of a parameter set.
    ///
    /// Rules:
    /// - All fields are non-zero.
    /// - `memory_cost_kib >= 8 * parallelism`.
    /// - Salt and output lengths sit within the PHC ranges.
    /// - Cost values do not exceed the configured ceilings.
    /// - `version` is 16 or 19.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.memory_cost_kib == 0 {
            return Err(ParamsError::Zero("memory_cost_kib"));
        }
        if self.iterations == 0 {
            return Err(ParamsError::Zero("iterations"));
        }
        if self.parallelism == 0 {
            return Err(ParamsError::Zero("parallelism"));
        }
        if self.salt_len == 0 {
            return Err(ParamsError::Zero("salt_len"));
        }
        if self.output_len == 0 {
            return Err(ParamsError::Zero("output_len"));
        }
        if self.version == 0 {
            return Err(ParamsError::Zero("version"));
        }

        if self.parallelism > MAX_PARALLELISM {
            return Err(out_of_range("parallelism", self.parallelism as u64));
        }
        if (self.memory_cost_kib as u64) < 8 * self.parallelism as u64 {
            return Err(ParamsError::MemoryBelowLanes {
                memory_cost_kib: self.memory_cost_kib,
                parallelism: self.parallelism,
            });
        }
        if self.memory_cost_kib > MAX_MEMORY_COST_KIB {
            return Err(out_of_range("memory_cost_kib", self.memory_cost_kib as u64));
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(out_of_range("iterations", self.iterations as u64));
        }
        if !(MIN_SALT_LEN..=MAX_SALT_LEN).contains(&self.salt_len) {
            return Err(out_of_range("salt_len", self.salt_len as u64));
        }
        if !(MIN_OUTPUT_LEN..=MAX_OUTPUT_LEN).contains(&self.output_len) {
            return Err(out_of_range("output_len", self.output_len as u64));
        }
        if self.version != VERSION_0X10 && self.version != VERSION_0X13 {
            return Err(ParamsError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

fn out_of_range(field: &'static str, value: u64) -> ParamsError {
    ParamsError::OutOfRange { field, value }
}

impl Default for HashParameters {
    fn default() -> Self {
        Self {
            memory_cost_kib: DEFAULT_MEMORY_COST_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
            salt_len: DEFAULT_SALT_LEN,
            output_len: DEFAULT_OUTPUT_LEN,
            version: VERSION_0X13,
        }
    }
}

// ---------------------------------------------------------------------------
// ParameterPolicy
// ---------------------------------------------------------------------------

/// Process-wide hashing policy, fixed at startup.
///
/// Shared read-only (behind `Arc`) by every request.
#[derive(Debug, Clone)]
pub struct ParameterPolicy {
    params: HashParameters,
    max_password_bytes: usize,
    max_cost_factor: u32,
}

impl ParameterPolicy {
    pub fn new(params: HashParameters, max_password_bytes: usize) -> Result<Self, ParamsError> {
        params.validate()?;
        if max_password_bytes == 0 {
            return Err(ParamsError::Zero("max_password_bytes"));
        }
        Ok(Self {
            params,
            max_password_bytes,
            max_cost_factor: DEFAULT_MAX_COST_FACTOR,
        })
    }

    /// Replace the multiple of the current `m x t` a stored hash may cost.
    pub fn with_max_cost_factor(mut self, factor: u32) -> Result<Self, ParamsError> {
        if factor == 0 {
            return Err(ParamsError::Zero("max_cost_factor"));
        }
        self.max_cost_factor = factor;
        Ok(self)
    }

    /// Parameters applied to every new hash.
    pub fn current(&self) -> HashParameters {
        self.params
    }

    /// Reject empty or over-long passwords before any hashing work.
    pub fn check_password(&self, password: &[u8]) -> Result<(), HashError> {
        if password.is_empty() {
            return Err(HashError::EmptyPassword);
        }
        if password.len() > self.max_password_bytes {
            return Err(HashError::PasswordTooLong {
                max: self.max_password_bytes,
            });
        }
        Ok(())
    }

    /// Whether a hash produced under `stored` should be re-issued under the
    /// current policy after a successful verification.
    pub fn needs_rehash(&self, stored: &HashParameters) -> bool {
        *stored != self.params
    }

    /// Refuse stored parameters whose `m x t` work exceeds
    /// `max_cost_factor` times the current policy. Applied on top of the
    /// absolute ceilings in [`HashParameters::validate`].
    pub fn check_stored(&self, stored: &HashParameters) -> Result<(), ParamsError> {
        let cost = work(stored);
        let limit = work(&self.params).saturating_mul(u64::from(self.max_cost_factor));
        if cost > limit {
            return Err(ParamsError::CostAbovePolicy { cost, limit });
        }
        Ok(())
    }
}

fn work(params: &HashParameters) -> u64 {
    u64::from(params.memory_cost_kib) * u64::from(params.iterations)
}

impl Default for ParameterPolicy {
    fn default() -> Self {
        Self {
            params: HashParameters::default(),
            max_password_bytes: DEFAULT_MAX_PASSWORD_BYTES,
            max_cost_factor: DEFAULT_MAX_COST_FACTOR,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(HashParameters::default().validate(), Ok(()));
        assert_eq!(HashParameters::default().version, VERSION_0X13);
    }

    #[test]
    fn zero_fields_are_rejected() {
        assert_eq!(
            HashParameters::new(0, 2, 1, 16, 32),
            Err(ParamsError::Zero("memory_cost_kib"))
        );
        assert_eq!(
            HashParameters::new(1024, 0, 1, 16, 32),
            Err(ParamsError::Zero("iterations"))
        );
        assert_eq!(
            HashParameters::new(1024, 2, 0, 16, 32),
            Err(ParamsError::Zero("parallelism"))
        );
        assert_eq!(
            HashParameters::new(1024, 2, 1, 0, 32),
            Err(ParamsError::Zero("salt_len"))
        );
    }

    #[test]
    fn memory_must_cover_eight_blocks_per_lane() {
        assert_matches!(
            HashParameters::new(31, 1, 4, 16, 32),
            Err(ParamsError::MemoryBelowLanes { .. })
        );
        assert!(HashParameters::new(32, 1, 4, 16, 32).is_ok());
    }

    #[test]
    fn lengths_outside_phc_range_are_rejected() {
        assert_matches!(
            HashParameters::new(1024, 1, 1, 4, 32),
            Err(ParamsError::OutOfRange { field: "salt_len", .. })
        );
        assert_matches!(
            HashParameters::new(1024, 1, 1, 16, 65),
            Err(ParamsError::OutOfRange { field: "output_len", .. })
        );
    }

    #[test]
    fn unknown_version_is_rejected() {
        let params = HashParameters {
            version: 0x12,
            ..HashParameters::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::UnsupportedVersion(0x12)));
    }

    #[test]
    fn policy_checks_password_length() {
        let policy = ParameterPolicy::new(HashParameters::default(), 8).unwrap();
        assert_matches!(policy.check_password(b""), Err(HashError::EmptyPassword));
        assert_matches!(
            policy.check_password(b"123456789"),
            Err(HashError::PasswordTooLong { max: 8 })
        );
        assert!(policy.check_password(b"12345678").is_ok());
    }

    #[test]
    fn needs_rehash_when_parameters_drift() {
        let policy = ParameterPolicy::default();
        let current = policy.current();
        assert!(!policy.needs_rehash(&current));

        let weaker = HashParameters {
            iterations: 1,
            ..current
        };
        assert!(policy.needs_rehash(&weaker));
    }

    #[test]
    fn stored_cost_is_bounded_by_policy_multiple() {
        let current = HashParameters::new(256, 2, 1, 16, 32).unwrap();
        let policy = ParameterPolicy::new(current, 64).unwrap();

        assert_eq!(policy.check_stored(&current), Ok(()));
        let older = HashParameters::new(128, 1, 1, 16, 32).unwrap();
        assert_eq!(policy.check_stored(&older), Ok(()));

        // 4 x (256 x 2) = 2048 is the ceiling.
        let at_limit = HashParameters::new(1024, 2, 1, 16, 32).unwrap();
        assert_eq!(policy.check_stored(&at_limit), Ok(()));

        let crafted = HashParameters::new(MAX_MEMORY_COST_KIB, MAX_ITERATIONS, 1, 16, 32).unwrap();
        assert_matches!(
            policy.check_stored(&crafted),
            Err(ParamsError::CostAbovePolicy { limit: 2048, .. })
        );

        let strict = policy.with_max_cost_factor(1).unwrap();
        assert_matches!(
            strict.check_stored(&at_limit),
            Err(ParamsError::CostAbovePolicy { .. })
        );
    }

    #[test]
    fn cost_factor_must_be_positive() {
        assert_eq!(
            ParameterPolicy::default().with_max_cost_factor(0).unwrap_err(),
            ParamsError::Zero("max_cost_factor")
        );
    }
}
