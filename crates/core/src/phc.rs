//! PHC string codec for Argon2id hashes.
//!
//! Format: `$argon2id$v=<version>$m=<kib>,t=<iterations>,p=<lanes>$<salt>$<digest>`
//! where salt and digest use the standard base64 alphabet without padding.
//!
//! Decoding is pure parsing and never hashes anything. Every segment is
//! parsed before the result is chosen, so a malformed string costs the same
//! work whichever segment is wrong.

use std::fmt;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use serde::Serialize;

use crate::params::{HashParameters, ParamsError, VERSION_0X10, VERSION_0X13};

/// Algorithm identifier of the only supported variant.
pub const ALGORITHM_ID: &str = "argon2id";

/// Longest string [`decode`] will look at. Generous for the widest legal
/// salt and digest plus decimal parameters.
const MAX_ENCODED_LEN: usize = 256;

/// Structural rule a PHC string broke. Kept for logs and tests; transports
/// report every variant as `invalid_hash`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("wrong number of `$`-separated segments")]
    Structure,
    #[error("algorithm is not argon2id")]
    Algorithm,
    #[error("malformed or unsupported version segment")]
    Version,
    #[error("malformed cost segment")]
    Costs,
    #[error("salt is not valid unpadded base64")]
    Salt,
    #[error("digest is not valid unpadded base64")]
    Digest,
    #[error("parameters out of range: {0}")]
    Parameters(#[source] ParamsError),
}

/// An encoded hash in PHC string form. The only representation callers
/// persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EncodedHash(String);

impl EncodedHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The parts recovered from a PHC string.
///
/// `params.salt_len` and `params.output_len` always equal the decoded
/// lengths of `salt` and `digest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHash {
    pub params: HashParameters,
    pub salt: Vec<u8>,
    pub digest: Vec<u8>,
}

/// Render parameters, salt, and digest as a PHC string.
pub fn encode(params: &HashParameters, salt: &[u8], digest: &[u8]) -> EncodedHash {
    debug_assert_eq!(salt.len(), params.salt_len);
    debug_assert_eq!(digest.len(), params.output_len);

    EncodedHash(format!(
        "${ALGORITHM_ID}$v={}$m={},t={},p={}${}${}",
        params.version,
        params.memory_cost_kib,
        params.iterations,
        params.parallelism,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(digest),
    ))
}

/// Parse and validate a PHC string.
pub fn decode(text: &str) -> Result<DecodedHash, DecodeError> {
    if text.len() > MAX_ENCODED_LEN {
        return Err(DecodeError::Structure);
    }

    let mut segments = text.split('$');
    let leading = segments.next();
    let algorithm = segments.next();
    let version = segments.next();
    let costs = segments.next();
    let salt = segments.next();
    let digest = segments.next();
    let trailing = segments.next();

    let structure_ok = leading == Some("") && digest.is_some() && trailing.is_none();
    let algorithm_ok = algorithm == Some(ALGORITHM_ID);
    let version = version.and_then(parse_version);
    let costs = costs.and_then(parse_costs);
    let salt = salt.and_then(decode_b64);
    let digest = digest.and_then(decode_b64);

    match (structure_ok, algorithm_ok, version, costs, salt, digest) {
        (true, true, Some(version), Some((m, t, p)), Some(salt), Some(digest)) => {
            let params = HashParameters {
                memory_cost_kib: m,
                iterations: t,
                parallelism: p,
                salt_len: salt.len(),
                output_len: digest.len(),
                version,
            };
            params.validate().map_err(DecodeError::Parameters)?;
            Ok(DecodedHash {
                params,
                salt,
                digest,
            })
        }
        (false, ..) => Err(DecodeError::Structure),
        (_, false, ..) => Err(DecodeError::Algorithm),
        (_, _, None, ..) => Err(DecodeError::Version),
        (_, _, _, None, ..) => Err(DecodeError::Costs),
        (_, _, _, _, None, _) => Err(DecodeError::Salt),
        (_, _, _, _, _, None) => Err(DecodeError::Digest),
    }
}

fn parse_version(segment: &str) -> Option<u32> {
    let version = parse_decimal(segment.strip_prefix("v=")?)?;
    (version == VERSION_0X10 || version == VERSION_0X13).then_some(version)
}

/// Parse `m=<u32>,t=<u32>,p=<u32>` in exactly that order.
fn parse_costs(segment: &str) -> Option<(u32, u32, u32)> {
    let mut pairs = segment.split(',');
    let m = parse_decimal(pairs.next()?.strip_prefix("m=")?)?;
    let t = parse_decimal(pairs.next()?.strip_prefix("t=")?)?;
    let p = parse_decimal(pairs.next()?.strip_prefix("p=")?)?;
    if pairs.next().is_some() {
        return None;
    }
    Some((m, t, p))
}

/// PHC decimals: ASCII digits only, no sign, no leading zeros.
fn parse_decimal(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if text.len() > 1 && text.starts_with('0') {
        return None;
    }
    text.parse().ok()
}

fn decode_b64(segment: &str) -> Option<Vec<u8>> {
    STANDARD_NO_PAD.decode(segment).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
