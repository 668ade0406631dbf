//! Page vault error types.

use pagevault_crypto::CryptoError;
use pagevault_storage::StorageError;
use thiserror::Error;

/// Result type for ingestion and delivery operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors surfaced by the ingestion and delivery pipelines.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Missing or invalid startup configuration. The process must not serve.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("page not found: {document_id}/{page_no}")]
    NotFound { document_id: String, page_no: u32 },

    #[error("caller is not authorized")]
    Unauthorized,

    /// Tag mismatch on unwrap or decrypt, or a blob that does not match its
    /// metadata.
    #[error("integrity failure: {0}")]
    Integrity(String),

    #[error("blob storage failed: {0}")]
    Storage(String),

    #[error("metadata storage failed: {0}")]
    Metadata(#[from] StorageError),

    #[error("crypto error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for VaultError {
    fn from(err: CryptoError) -> Self {
        if err.is_integrity_failure() {
            VaultError::Integrity(err.to_string())
        } else {
            VaultError::Crypto(err)
        }
    }
}

/// Coarse classification of a [`VaultError`] for callers that respond
/// over a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    Unauthorized,
    Integrity,
    Storage,
    Internal,
}

impl ErrorKind {
    /// HTTP-class status for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Configuration | ErrorKind::Integrity | ErrorKind::Internal => 500,
            ErrorKind::Storage => 502,
        }
    }
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Configuration(_) => ErrorKind::Configuration,
            VaultError::Validation(_) => ErrorKind::Validation,
            VaultError::NotFound { .. } => ErrorKind::NotFound,
            VaultError::Unauthorized => ErrorKind::Unauthorized,
            VaultError::Integrity(_) => ErrorKind::Integrity,
            VaultError::Storage(_) | VaultError::Metadata(_) => ErrorKind::Storage,
            VaultError::Crypto(_) => ErrorKind::Internal,
        }
    }
}
