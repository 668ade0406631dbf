//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from the page encryption layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// AEAD tag verification failed. No plaintext is released.
    #[error("integrity check failed (tampered data or wrong key)")]
    IntegrityFailure,

    /// A wrapped page key did not authenticate under the master key.
    #[error("wrapped key does not match the master key")]
    KeyMismatch,

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid {field} length: expected {expected}, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("malformed blob frame: {0}")]
    MalformedFrame(String),

    #[error("blob header does not match its metadata")]
    FrameMismatch,

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl CryptoError {
    /// True for failures that indicate tampering or a key mix-up rather than
    /// a local fault.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::IntegrityFailure
                | CryptoError::KeyMismatch
                | CryptoError::MalformedFrame(_)
                | CryptoError::FrameMismatch
        )
    }
}
