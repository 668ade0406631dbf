//! Object-store interface for encrypted page blobs.

use crate::error::VaultResult;
use async_trait::async_trait;
use std::time::Duration;

/// Narrow interface over the external object store.
///
/// `put` must be all-or-nothing: a failed upload leaves no partial object
/// visible to readers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes (or overwrites) the object at `path`.
    async fn put(&self, path: &str, bytes: Vec<u8>) -> VaultResult<()>;

    /// Reads the full object at `path`.
    async fn get(&self, path: &str) -> VaultResult<Vec<u8>>;

    /// Issues a time-limited read URL for `path`.
    async fn sign_url(&self, path: &str, ttl: Duration) -> VaultResult<String>;
}
