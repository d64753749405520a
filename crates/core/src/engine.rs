//! Argon2id hashing engine.
//!
//! Synchronous and CPU/memory bound. Async callers go through
//! [`crate::service::HashingService`], which admits the work and moves it
//! onto the blocking pool.

use argon2::{Algorithm, Argon2, Block, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::HashError;
use crate::params::{HashParameters, VERSION_0X10};
use crate::phc::{self, EncodedHash};

/// Hash `password` under `params` with a fresh random salt.
///
/// Empty passwords are rejected before any salt is drawn or memory reserved.
pub fn hash(password: &[u8], params: &HashParameters) -> Result<EncodedHash, HashError> {
    if password.is_empty() {
        return Err(HashError::EmptyPassword);
    }

    let mut salt = vec![0u8; params.salt_len];
    rand::rng().fill_bytes(&mut salt);

    let digest = compute_digest(password, &salt, params)?;
    Ok(phc::encode(params, &salt, &digest))
}

/// Run Argon2id over `(password, salt)` and return `params.output_len` bytes.
///
/// The working memory is reserved up front so an allocation failure is
/// reported as [`HashError::Internal`] instead of aborting the process.
pub fn compute_digest(
    password: &[u8],
    salt: &[u8],
    params: &HashParameters,
) -> Result<Zeroizing<Vec<u8>>, HashError> {
    let argon2 = argon2_for(params)?;
    let mut blocks = reserve_blocks(argon2.params().block_count())?;

    let mut digest = Zeroizing::new(vec![0u8; params.output_len]);
    argon2
        .hash_password_into_with_memory(password, salt, digest.as_mut_slice(), &mut blocks)
        .map_err(|e| HashError::Internal(format!("argon2 computation failed: {e}")))?;

    Ok(digest)
}

fn argon2_for(params: &HashParameters) -> Result<Argon2<'static>, HashError> {
    let argon_params = Params::new(
        params.memory_cost_kib,
        params.iterations,
        params.parallelism,
        Some(params.output_len),
    )
    .map_err(|e| HashError::Internal(format!("argon2 rejected parameters: {e}")))?;

    let version = if params.version == VERSION_0X10 {
        Version::V0x10
    } else {
        Version::V0x13
    };

    Ok(Argon2::new(Algorithm::Argon2id, version, argon_params))
}

fn reserve_blocks(count: usize) -> Result<Vec<Block>, HashError> {
    let mut blocks = Vec::new();
    blocks.try_reserve_exact(count).map_err(|_| {
        HashError::Internal(format!("cannot allocate {count} argon2 memory blocks"))
    })?;
    blocks.resize(count, Block::default());
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::params::VERSION_0X13;

    fn cheap_params() -> HashParameters {
        HashParameters::new(256, 1, 1, 16, 32).unwrap()
    }

    #[test]
    fn matches_argon2_reference_api() {
        let params = cheap_params();
        let salt = b"0123456789abcdef";

        let ours = compute_digest(b"my-secret", salt, &params).unwrap();

        let mut expected = [0u8; 32];
        Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(256, 1, 1, Some(32)).unwrap(),
        )
        .hash_password_into(b"my-secret", salt, &mut expected)
        .unwrap();

        assert_eq!(ours.as_slice(), expected.as_slice());
    }

    #[test]
    fn digest_depends_on_salt_and_version() {
        let params = cheap_params();
        let a = compute_digest(b"pw", b"saltsaltsaltsalt", &params).unwrap();
        let b = compute_digest(b"pw", b"SALTSALTSALTSALT", &params).unwrap();
        assert_ne!(a, b);

        let legacy = HashParameters {
            version: VERSION_0X10,
            ..params
        };
        let c = compute_digest(b"pw", b"saltsaltsaltsalt", &legacy).unwrap();
        assert_ne!(a, c);
        assert_eq!(params.version, VERSION_0X13);
    }

    #[test]
    fn output_length_follows_params() {
        let params = HashParameters::new(256, 1, 1, 16, 48).unwrap();
        let digest = compute_digest(b"pw", b"saltsaltsaltsalt", &params).unwrap();
        assert_eq!(digest.len(), 48);
    }

    #[test]
    fn hash_emits_phc_string_with_fresh_salt() {
        let params = cheap_params();
        let first = hash(b"my-secret", &params).unwrap();
        let second = hash(b"my-secret", &params).unwrap();

        assert!(first.as_str().starts_with("$argon2id$v=19$m=256,t=1,p=1$"));
        assert_ne!(first, second);

        let decoded = phc::decode(first.as_str()).unwrap();
        assert_eq!(decoded.params, params);
        assert_eq!(decoded.salt.len(), 16);
    }

    #[test]
    fn hash_rejects_empty_password() {
        assert_matches!(hash(b"", &cheap_params()), Err(HashError::EmptyPassword));
    }
}
