//! Shared test helpers: in-memory stores that count every call, plus
//! pipeline wiring and sample pages.

#![allow(dead_code)]

use async_trait::async_trait;
use pagevault_cloud::{BlobStore, DeliveryPipeline, IngestPipeline, VaultError, VaultResult};
use pagevault_crypto::{KeyHierarchy, MasterKey};
use pagevault_storage::{MemoryMetadataStore, MetadataStore, PageMetadata, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const MIN_PAGE_BYTES: usize = 1024;
pub const SIGN_TTL: Duration = Duration::from_secs(60);

// ── Blob store ──

/// HashMap-backed blob store recording how often each operation ran.
#[derive(Default)]
pub struct CountingBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    gets: AtomicUsize,
    signs: AtomicUsize,
    fail_puts: AtomicBool,
}

impl CountingBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn signs(&self) -> usize {
        self.signs.load(Ordering::SeqCst)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    /// Overwrites an object behind the pipeline's back.
    pub fn replace(&self, path: &str, bytes: Vec<u8>) {
        self.objects.lock().unwrap().insert(path.to_string(), bytes);
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().remove(path)
    }

    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for CountingBlobStore {
    async fn put(&self, path: &str, bytes: Vec<u8>) -> VaultResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(VaultError::Storage("injected put failure".into()));
        }
        self.objects.lock().unwrap().insert(path.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, path: &str) -> VaultResult<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.object(path)
            .ok_or_else(|| VaultError::Storage(format!("no such object: {path}")))
    }

    async fn sign_url(&self, path: &str, ttl: Duration) -> VaultResult<String> {
        self.signs.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://blobs.test/{path}?expires={}", ttl.as_secs()))
    }
}

// ── Metadata store ──

/// [`MemoryMetadataStore`] with call counters and failure injection.
#[derive(Default)]
pub struct CountingMetadataStore {
    inner: MemoryMetadataStore,
    upserts: AtomicUsize,
    gets: AtomicUsize,
    fail_upserts: AtomicBool,
}

impl CountingMetadataStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    /// Reads a row without touching the counters.
    pub async fn peek(&self, document_id: &str, page_no: u32) -> Option<PageMetadata> {
        self.inner.get(document_id, page_no).await.unwrap()
    }

    pub fn fail_upserts(&self) {
        self.fail_upserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataStore for CountingMetadataStore {
    async fn upsert(&self, meta: &PageMetadata) -> StorageResult<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StorageError::Task("injected upsert failure".into()));
        }
        self.inner.upsert(meta).await
    }

    async fn get(&self, document_id: &str, page_no: u32) -> StorageResult<Option<PageMetadata>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(document_id, page_no).await
    }
}

// ── Wiring ──

pub fn test_keys(seed: u8) -> Arc<KeyHierarchy> {
    Arc::new(KeyHierarchy::new(MasterKey::from_bytes([seed; 32])))
}

/// Both pipelines sharing one key hierarchy and one pair of stores.
pub struct Harness {
    pub keys: Arc<KeyHierarchy>,
    pub blobs: Arc<CountingBlobStore>,
    pub metadata: Arc<CountingMetadataStore>,
    pub ingest: IngestPipeline,
    pub delivery: DeliveryPipeline,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_keys(test_keys(7))
    }

    pub fn with_keys(keys: Arc<KeyHierarchy>) -> Self {
        let blobs = CountingBlobStore::new();
        let metadata = CountingMetadataStore::new();
        let ingest = IngestPipeline::new(
            Arc::clone(&keys),
            blobs.clone(),
            metadata.clone(),
            MIN_PAGE_BYTES,
        );
        let delivery = DeliveryPipeline::new(Arc::clone(&keys), blobs.clone(), metadata.clone(), SIGN_TTL);
        Self {
            keys,
            blobs,
            metadata,
            ingest,
            delivery,
        }
    }

    /// A delivery pipeline over the same stores but a different master key.
    pub fn delivery_with_keys(&self, keys: Arc<KeyHierarchy>) -> DeliveryPipeline {
        DeliveryPipeline::new(keys, self.blobs.clone(), self.metadata.clone(), SIGN_TTL)
    }

    /// A delivery pipeline over the same stores with its own signing TTL.
    pub fn delivery_with_ttl(&self, ttl: Duration) -> DeliveryPipeline {
        DeliveryPipeline::new(Arc::clone(&self.keys), self.blobs.clone(), self.metadata.clone(), ttl)
    }
}

// ── Sample data ──

/// PNG signature followed by `len - 8` bytes of deterministic filler.
pub fn sample_png(len: usize, fill: u8) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend((0..len.saturating_sub(8)).map(|i| fill.wrapping_add(i as u8)));
    bytes
}

/// Per-test unique document id to prevent collisions in shared buckets.
pub fn unique_document_id() -> String {
    format!("test-{}", Uuid::new_v4())
}
