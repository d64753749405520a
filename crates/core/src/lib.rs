//! Argon2id credential hashing core.
//!
//! - [`params`] -- cost parameters and the process-wide policy.
//! - [`phc`] -- PHC string encoding and decoding.
//! - [`engine`] -- Argon2id hashing with fresh salts.
//! - [`verify`] -- recomputation and constant-time comparison.
//! - [`admission`] -- bounded concurrency for memory-hard work.
//! - [`service`] -- async facade tying the above together.
//!
//! Stateless across calls apart from the admission counters. Nothing here
//! persists hashes; callers store the returned [`phc::EncodedHash`].

pub mod admission;
pub mod engine;
pub mod error;
pub mod params;
pub mod phc;
pub mod service;
pub mod verify;

pub use error::{ErrorClass, HashError};
pub use params::{HashParameters, ParameterPolicy};
pub use phc::EncodedHash;
pub use service::{HashingService, ServiceConfig, Verification};
