//! Page ingestion: raw image in, encrypted blob and metadata row out.

use crate::blob_store::BlobStore;
use crate::error::{VaultError, VaultResult};
use crate::types::{IngestReceipt, IngestRequest, page_blob_path, validate_document_id, validate_page_no};
use pagevault_crypto::{KeyHierarchy, PageKey, encode_blob, encrypt};
use pagevault_storage::{MetadataStore, PageMetadata};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Encrypts page images under fresh page keys and records how to reverse it.
pub struct IngestPipeline {
    keys: Arc<KeyHierarchy>,
    blobs: Arc<dyn BlobStore>,
    metadata: Arc<dyn MetadataStore>,
    min_page_bytes: usize,
}

impl IngestPipeline {
    pub fn new(
        keys: Arc<KeyHierarchy>,
        blobs: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        min_page_bytes: usize,
    ) -> Self {
        Self {
            keys,
            blobs,
            metadata,
            min_page_bytes,
        }
    }

    /// Ingests one page.
    ///
    /// The blob is uploaded before the metadata row is written, so a failed
    /// upload leaves no trace. A failed metadata write after a successful
    /// upload is reported and leaves an orphaned blob behind; re-ingesting
    /// the page overwrites it.
    pub async fn ingest(&self, request: IngestRequest) -> VaultResult<IngestReceipt> {
        validate_document_id(&request.document_id)?;
        validate_page_no(request.page_no)?;
        if request.image_bytes.len() < self.min_page_bytes {
            return Err(VaultError::Validation(format!(
                "page image is {} bytes, minimum is {}",
                request.image_bytes.len(),
                self.min_page_bytes
            )));
        }

        let page_key = PageKey::generate();
        let sealed = encrypt(page_key.as_bytes(), &request.image_bytes, None)?;
        let wrapped_key = self.keys.wrap(&page_key)?;
        drop(page_key);

        let blob_path = page_blob_path(&request.document_id, request.page_no);
        let framed = encode_blob(&sealed);
        let framed_len = framed.len();

        self.blobs.put(&blob_path, framed).await?;
        debug!(
            document_id = %request.document_id,
            page_no = request.page_no,
            %blob_path,
            bytes = framed_len,
            "page blob stored"
        );

        let meta = PageMetadata {
            document_id: request.document_id,
            page_no: request.page_no,
            blob_path,
            content_iv: sealed.iv,
            content_tag: sealed.tag,
            wrapped_key,
        };

        if let Err(e) = self.metadata.upsert(&meta).await {
            error!(
                document_id = %meta.document_id,
                page_no = meta.page_no,
                blob_path = %meta.blob_path,
                "metadata write failed after blob upload; blob left orphaned: {e}"
            );
            return Err(e.into());
        }

        info!(
            document_id = %meta.document_id,
            page_no = meta.page_no,
            "page ingested"
        );
        Ok(IngestReceipt {
            ok: true,
            blob_path: meta.blob_path,
        })
    }
}
