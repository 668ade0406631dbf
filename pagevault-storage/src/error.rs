//! Metadata storage error types.

use thiserror::Error;

/// Result type for metadata storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in the metadata store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    /// A persisted row could not be decoded back into page metadata.
    #[error("corrupt metadata record for {document_id}/{page_no}: {reason}")]
    CorruptRecord {
        document_id: String,
        page_no: u32,
        reason: String,
    },

    #[error("connection lock poisoned")]
    LockPoisoned,

    #[error("storage task failed: {0}")]
    Task(String),
}
