//! Page delivery to authorized readers.
//!
//! Two modes share the same gatekeeping: the authorization verdict is
//! checked before any metadata or blob access, and a missing page is
//! reported separately from an unauthorized caller.

use crate::blob_store::BlobStore;
use crate::config::{MAX_SIGN_TTL_SECS, MIN_SIGN_TTL_SECS};
use crate::error::{VaultError, VaultResult};
use crate::types::{
    Delivery, DeliveryMode, DeliveryRequest, KeyGrant, PageStream, sniff_content_type,
    validate_document_id, validate_page_no,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use pagevault_crypto::{KeyHierarchy, decode_blob_checked, decrypt};
use pagevault_storage::{MetadataStore, PageMetadata};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cache directive attached to every streamed page.
pub const NO_STORE: &str = "no-store";

/// Serves stored pages as plaintext streams or key grants.
pub struct DeliveryPipeline {
    keys: Arc<KeyHierarchy>,
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    sign_ttl: Duration,
}

impl DeliveryPipeline {
    /// `sign_ttl` is clamped to between one second and [`MAX_SIGN_TTL_SECS`].
    pub fn new(
        keys: Arc<KeyHierarchy>,
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        sign_ttl: Duration,
    ) -> Self {
        Self {
            keys,
            blobs,
            metadata,
            sign_ttl: sign_ttl.clamp(
                Duration::from_secs(MIN_SIGN_TTL_SECS),
                Duration::from_secs(MAX_SIGN_TTL_SECS),
            ),
        }
    }

    pub async fn deliver(&self, request: DeliveryRequest) -> VaultResult<Delivery> {
        match request.mode {
            DeliveryMode::Stream => self
                .stream(&request.document_id, request.page_no, request.authorized)
                .await
                .map(Delivery::Stream),
            DeliveryMode::Bundle => self
                .bundle(&request.document_id, request.page_no, request.authorized)
                .await
                .map(Delivery::Bundle),
        }
    }

    /// Fetches, verifies and decrypts a page server-side. The page key never
    /// leaves the process.
    pub async fn stream(
        &self,
        document_id: &str,
        page_no: u32,
        authorized: bool,
    ) -> VaultResult<PageStream> {
        let meta = self.lookup(document_id, page_no, authorized).await?;
        let result = self.stream_page(&meta).await;
        log_integrity_failure(&meta, DeliveryMode::Stream, &result);
        result
    }

    /// Issues a signed blob URL together with the unwrapped page key.
    pub async fn bundle(
        &self,
        document_id: &str,
        page_no: u32,
        authorized: bool,
    ) -> VaultResult<KeyGrant> {
        let meta = self.lookup(document_id, page_no, authorized).await?;
        let result = self.grant_page(&meta).await;
        log_integrity_failure(&meta, DeliveryMode::Bundle, &result);
        result
    }

    /// Authorization gate followed by the metadata lookup.
    async fn lookup(
        &self,
        document_id: &str,
        page_no: u32,
        authorized: bool,
    ) -> VaultResult<PageMetadata> {
        if !authorized {
            debug!("delivery rejected: caller not authorized");
            return Err(VaultError::Unauthorized);
        }
        validate_document_id(document_id)?;
        validate_page_no(page_no)?;

        self.metadata
            .get(document_id, page_no)
            .await?
            .ok_or_else(|| VaultError::NotFound {
                document_id: document_id.to_string(),
                page_no,
            })
    }

    async fn stream_page(&self, meta: &PageMetadata) -> VaultResult<PageStream> {
        let blob = self.blobs.get(&meta.blob_path).await?;
        let sealed = decode_blob_checked(&blob, &meta.content_iv, &meta.content_tag)?;

        let page_key = self.keys.unwrap(&meta.wrapped_key)?;
        let bytes = decrypt(page_key.as_bytes(), &sealed)?;

        debug!(
            document_id = %meta.document_id,
            page_no = meta.page_no,
            bytes = bytes.len(),
            "page decrypted for streaming"
        );
        Ok(PageStream {
            content_type: sniff_content_type(&bytes),
            cache_control: NO_STORE,
            bytes,
        })
    }

    async fn grant_page(&self, meta: &PageMetadata) -> VaultResult<KeyGrant> {
        let page_key = self.keys.unwrap(&meta.wrapped_key)?;
        let url = self.blobs.sign_url(&meta.blob_path, self.sign_ttl).await?;
        let expires_in = self.sign_ttl.as_secs();

        info!(
            target: "pagevault::audit",
            document_id = %meta.document_id,
            page_no = meta.page_no,
            expires_in,
            "page key granted to client"
        );
        Ok(KeyGrant {
            url,
            key: page_key.to_base64(),
            iv: BASE64.encode(meta.content_iv),
            tag: BASE64.encode(meta.content_tag),
            expires_in,
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(expires_in as i64),
        })
    }
}

fn log_integrity_failure<T>(meta: &PageMetadata, mode: DeliveryMode, result: &VaultResult<T>) {
    if let Err(VaultError::Integrity(reason)) = result {
        warn!(
            target: "pagevault::security",
            document_id = %meta.document_id,
            page_no = meta.page_no,
            ?mode,
            "integrity failure during delivery: {reason}"
        );
    }
}
