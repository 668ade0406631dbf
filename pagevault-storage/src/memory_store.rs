//! In-process page metadata store.

use crate::error::StorageResult;
use crate::record::PageMetadata;
use crate::MetadataStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe map of `(document_id, page_no)` to page metadata.
#[derive(Clone, Default)]
pub struct MemoryMetadataStore {
    pages: Arc<RwLock<HashMap<(String, u32), PageMetadata>>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored pages.
    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    /// Returns true if no pages are stored.
    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn upsert(&self, meta: &PageMetadata) -> StorageResult<()> {
        self.pages
            .write()
            .await
            .insert((meta.document_id.clone(), meta.page_no), meta.clone());
        Ok(())
    }

    async fn get(&self, document_id: &str, page_no: u32) -> StorageResult<Option<PageMetadata>> {
        Ok(self
            .pages
            .read()
            .await
            .get(&(document_id.to_string(), page_no))
            .cloned())
    }
}
