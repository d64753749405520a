use crate::phc::DecodeError;

/// Broad category of a [`HashError`], used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller supplied bad input. Recoverable by fixing the request.
    Validation,
    /// No admission slot was free in time. Retry with backoff.
    Overload,
    /// Resource exhaustion or a computation fault on our side.
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("password must not be empty")]
    EmptyPassword,

    #[error("password exceeds {max} bytes")]
    PasswordTooLong { max: usize },

    #[error("stored hash must not be empty")]
    EmptyHash,

    #[error("stored hash is not a well-formed argon2id PHC string")]
    InvalidHash(#[source] DecodeError),

    #[error("hashing capacity exhausted, retry later")]
    Busy,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HashError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            HashError::EmptyPassword => "empty_password",
            HashError::PasswordTooLong { .. } => "password_too_long",
            HashError::EmptyHash => "empty_hash",
            HashError::InvalidHash(_) => "invalid_hash",
            HashError::Busy => "busy",
            HashError::Internal(_) => "internal_error",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            HashError::EmptyPassword
            | HashError::PasswordTooLong { .. }
            | HashError::EmptyHash
            | HashError::InvalidHash(_) => ErrorClass::Validation,
            HashError::Busy => ErrorClass::Overload,
            HashError::Internal(_) => ErrorClass::Internal,
        }
    }
}
