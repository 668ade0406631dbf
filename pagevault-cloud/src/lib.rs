//! Page ingestion and delivery for PageVault.
//!
//! Provides envelope-encrypted page storage with:
//! - Per-page random content keys wrapped under one master key
//! - S3 blob storage at deterministic per-page paths
//! - Idempotent metadata upserts keyed by `(document_id, page_no)`
//! - Stream delivery (server-side decryption, no caching)
//! - Bundle delivery (signed URL plus page key for client-side decryption)
//!
//! Requests share nothing mutable; the only process-wide state is the
//! immutable [`KeyHierarchy`].

pub mod blob_store;
pub mod config;
pub mod delivery;
pub mod error;
pub mod ingest;
pub mod s3_transport;
pub mod secrets;
pub mod types;

pub use blob_store::BlobStore;
pub use config::VaultConfig;
pub use delivery::DeliveryPipeline;
pub use error::{ErrorKind, VaultError, VaultResult};
pub use ingest::IngestPipeline;
pub use types::*;

use pagevault_crypto::KeyHierarchy;
use pagevault_storage::MetadataStore;
use std::sync::Arc;
use std::time::Duration;

/// Both pipelines wired to one set of collaborators.
pub struct PageVault {
    ingest: IngestPipeline,
    delivery: DeliveryPipeline,
}

impl PageVault {
    pub fn new(
        keys: Arc<KeyHierarchy>,
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        config: &VaultConfig,
    ) -> VaultResult<Self> {
        config.validate()?;
        Ok(Self {
            ingest: IngestPipeline::new(
                Arc::clone(&keys),
                Arc::clone(&blobs),
                Arc::clone(&metadata),
                config.min_page_bytes,
            ),
            delivery: DeliveryPipeline::new(
                keys,
                blobs,
                metadata,
                Duration::from_secs(config.sign_ttl_secs),
            ),
        })
    }

    pub async fn ingest(&self, request: IngestRequest) -> VaultResult<IngestReceipt> {
        self.ingest.ingest(request).await
    }

    pub async fn deliver(&self, request: DeliveryRequest) -> VaultResult<Delivery> {
        self.delivery.deliver(request).await
    }

    pub fn delivery_pipeline(&self) -> &DeliveryPipeline {
        &self.delivery
    }
}
