//! Verification engine: recompute and compare in constant time.

use subtle::ConstantTimeEq;

use crate::engine;
use crate::error::HashError;
use crate::phc::{self, DecodedHash};

/// Verify `password` against a stored PHC string.
///
/// Checks run cheapest first and stop at the first failure:
///
/// 1. empty password -> [`HashError::EmptyPassword`]
/// 2. empty stored hash -> [`HashError::EmptyHash`]
/// 3. undecodable stored hash -> [`HashError::InvalidHash`]
/// 4. recompute under the stored parameters and salt
/// 5. constant-time comparison
///
/// A mismatch is `Ok(false)`, not an error.
pub fn verify(password: &[u8], stored_hash: &str) -> Result<bool, HashError> {
    if password.is_empty() {
        return Err(HashError::EmptyPassword);
    }
    if stored_hash.is_empty() {
        return Err(HashError::EmptyHash);
    }
    let decoded = phc::decode(stored_hash).map_err(HashError::InvalidHash)?;
    verify_decoded(password, &decoded)
}

/// Steps 4 and 5 of [`verify`], for callers that already decoded the hash.
pub fn verify_decoded(password: &[u8], decoded: &DecodedHash) -> Result<bool, HashError> {
    if password.is_empty() {
        return Err(HashError::EmptyPassword);
    }
    let recomputed = engine::compute_digest(password, &decoded.salt, &decoded.params)?;
    Ok(digests_match(&recomputed, &decoded.digest))
}

fn digests_match(recomputed: &[u8], stored: &[u8]) -> bool {
    recomputed.ct_eq(stored).into()
}
