//! Keywarden error types.

use thiserror::Error;

/// Errors that can occur while issuing, verifying, or revoking keys.
#[derive(Debug, Error)]
pub enum KeywardenError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A required request field is missing or the request body is malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// No record exists for the key.
    #[error("Key not found")]
    NotFound,

    /// The key is past its expiry time.
    #[error("Key expired")]
    Expired,

    /// The key is bound to a different HWID.
    #[error("HWID mismatch")]
    HwidMismatch,

    /// Store I/O error.
    #[error("Store I/O error: {0}")]
    StoreIO(String),

    /// A stored record could not be decoded.
    #[error("Corrupt key record: {0}")]
    CorruptRecord(String),

    /// Notification delivery failed. Logged by the notifier, never returned
    /// to callers of the key operations.
    #[error("Notifier transport error: {0}")]
    NotifierTransport(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KeywardenError {
    /// Whether this error is an unexpected server-side failure rather than a
    /// rejection of the caller's request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            KeywardenError::ConfigError(_)
                | KeywardenError::StoreIO(_)
                | KeywardenError::CorruptRecord(_)
                | KeywardenError::NotifierTransport(_)
                | KeywardenError::Internal(_)
        )
    }
}
