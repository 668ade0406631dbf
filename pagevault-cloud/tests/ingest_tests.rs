mod support;

use pagevault_cloud::{IngestRequest, VaultError, page_blob_path};
use pagevault_crypto::{HEADER_SIZE, decode_blob, decrypt};
use pretty_assertions::assert_eq;
use support::{Harness, MIN_PAGE_BYTES, sample_png};

// ── Happy path ──

#[tokio::test]
async fn ingest_stores_blob_and_metadata() {
    let h = Harness::new();
    let image = sample_png(4096, 1);

    let receipt = h
        .ingest
        .ingest(IngestRequest::new("A", 1, image.clone()))
        .await
        .unwrap();

    assert!(receipt.ok);
    assert_eq!(receipt.blob_path, "A/page-0001.enc");
    assert_eq!(h.blobs.puts(), 1);
    assert_eq!(h.metadata.upserts(), 1);

    let blob = h.blobs.object(&receipt.blob_path).unwrap();
    assert_eq!(blob.len(), HEADER_SIZE + image.len());

    let meta = h.metadata.peek("A", 1).await.unwrap();
    assert_eq!(meta.blob_path, receipt.blob_path);
    assert_eq!(&blob[..12], &meta.content_iv);
    assert_eq!(&blob[12..HEADER_SIZE], &meta.content_tag);
}

#[tokio::test]
async fn stored_blob_is_not_plaintext() {
    let h = Harness::new();
    let image = sample_png(2048, 9);
    h.ingest
        .ingest(IngestRequest::new("doc", 2, image.clone()))
        .await
        .unwrap();

    let blob = h.blobs.object(&page_blob_path("doc", 2)).unwrap();
    assert_ne!(&blob[HEADER_SIZE..], image.as_slice());
}

#[tokio::test]
async fn metadata_unwraps_to_key_that_opens_blob() {
    let h = Harness::new();
    let image = sample_png(MIN_PAGE_BYTES, 3);
    h.ingest
        .ingest(IngestRequest::new("doc", 5, image.clone()))
        .await
        .unwrap();

    let meta = h.metadata.peek("doc", 5).await.unwrap();
    let page_key = h.keys.unwrap(&meta.wrapped_key).unwrap();
    let sealed = decode_blob(&h.blobs.object(&meta.blob_path).unwrap()).unwrap();
    assert_eq!(decrypt(page_key.as_bytes(), &sealed).unwrap(), image);
}

#[tokio::test]
async fn minimum_size_is_inclusive() {
    let h = Harness::new();
    let result = h
        .ingest
        .ingest(IngestRequest::new("doc", 1, sample_png(MIN_PAGE_BYTES, 0)))
        .await;
    assert!(result.is_ok());
}

// ── Idempotency ──

#[tokio::test]
async fn reingest_replaces_record() {
    let h = Harness::new();
    let first = sample_png(2048, 1);
    let second = sample_png(3000, 2);

    h.ingest.ingest(IngestRequest::new("A", 1, first)).await.unwrap();
    let before = h.metadata.peek("A", 1).await.unwrap();

    h.ingest
        .ingest(IngestRequest::new("A", 1, second.clone()))
        .await
        .unwrap();
    let after = h.metadata.peek("A", 1).await.unwrap();

    assert_eq!(h.metadata.len().await, 1);
    assert_eq!(h.blobs.object_count(), 1);
    assert_ne!(before.content_iv, after.content_iv);
    assert_ne!(before.wrapped_key, after.wrapped_key);

    let page_key = h.keys.unwrap(&after.wrapped_key).unwrap();
    let sealed = decode_blob(&h.blobs.object(&after.blob_path).unwrap()).unwrap();
    assert_eq!(decrypt(page_key.as_bytes(), &sealed).unwrap(), second);
}

#[tokio::test]
async fn pages_get_independent_keys() {
    let h = Harness::new();
    let image = sample_png(2048, 4);
    h.ingest.ingest(IngestRequest::new("doc", 1, image.clone())).await.unwrap();
    h.ingest.ingest(IngestRequest::new("doc", 2, image)).await.unwrap();

    let one = h.keys.unwrap(&h.metadata.peek("doc", 1).await.unwrap().wrapped_key).unwrap();
    let two = h.keys.unwrap(&h.metadata.peek("doc", 2).await.unwrap().wrapped_key).unwrap();
    assert_ne!(one.as_bytes(), two.as_bytes());
}

// ── Validation ──

#[tokio::test]
async fn undersized_payload_rejected_before_any_side_effect() {
    let h = Harness::new();
    let err = h
        .ingest
        .ingest(IngestRequest::new("doc", 1, vec![0u8; 10]))
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::Validation(_)));
    assert_eq!(h.blobs.puts(), 0);
    assert_eq!(h.metadata.upserts(), 0);
}

#[tokio::test]
async fn one_byte_short_rejected() {
    let h = Harness::new();
    let err = h
        .ingest
        .ingest(IngestRequest::new("doc", 1, sample_png(MIN_PAGE_BYTES - 1, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Validation(_)));
}

#[tokio::test]
async fn invalid_identifiers_rejected() {
    let h = Harness::new();
    let image = sample_png(2048, 0);

    for (doc, page) in [("", 1), ("../etc", 1), ("a/b", 1), ("doc", 0)] {
        let err = h
            .ingest
            .ingest(IngestRequest::new(doc, page, image.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Validation(_)), "{doc:?}/{page}");
    }
    assert_eq!(h.blobs.puts(), 0);
    assert_eq!(h.metadata.upserts(), 0);
}

// ── Storage failures ──

#[tokio::test]
async fn failed_upload_writes_no_metadata() {
    let h = Harness::new();
    h.blobs.fail_puts();

    let err = h
        .ingest
        .ingest(IngestRequest::new("doc", 1, sample_png(2048, 0)))
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::Storage(_)));
    assert_eq!(h.metadata.upserts(), 0);
    assert_eq!(h.metadata.len().await, 0);
}

#[tokio::test]
async fn failed_metadata_write_is_reported() {
    let h = Harness::new();
    h.metadata.fail_upserts();

    let err = h
        .ingest
        .ingest(IngestRequest::new("doc", 1, sample_png(2048, 0)))
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::Metadata(_)));
    // The blob was already uploaded and stays behind.
    assert_eq!(h.blobs.object_count(), 1);
    assert_eq!(h.metadata.len().await, 0);
}
