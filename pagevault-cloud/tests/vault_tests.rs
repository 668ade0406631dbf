mod support;

use pagevault_cloud::{Delivery, DeliveryMode, DeliveryRequest, IngestRequest, PageVault, VaultConfig, VaultError};
use pagevault_storage::DuckDbMetadataStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use support::{CountingBlobStore, sample_png, test_keys};

#[tokio::test]
async fn vault_round_trip_over_duckdb() {
    let blobs = CountingBlobStore::new();
    let metadata = Arc::new(DuckDbMetadataStore::open_in_memory().unwrap());
    let vault = PageVault::new(test_keys(3), blobs.clone(), metadata.clone(), &VaultConfig::default()).unwrap();

    let image = sample_png(5000, 17);
    let receipt = vault
        .ingest(IngestRequest::new("manual-7", 12, image.clone()))
        .await
        .unwrap();
    assert_eq!(receipt.blob_path, "manual-7/page-0012.enc");
    assert_eq!(metadata.count().unwrap(), 1);

    let delivery = vault
        .deliver(DeliveryRequest {
            document_id: "manual-7".into(),
            page_no: 12,
            authorized: true,
            mode: DeliveryMode::Stream,
        })
        .await
        .unwrap();
    match delivery {
        Delivery::Stream(page) => assert_eq!(page.bytes, image),
        other => panic!("expected stream, got {other:?}"),
    }
}

#[tokio::test]
async fn vault_uses_configured_limits() {
    let config = VaultConfig {
        min_page_bytes: 16,
        sign_ttl_secs: 300,
        ..VaultConfig::default()
    };
    let blobs = CountingBlobStore::new();
    let metadata = Arc::new(DuckDbMetadataStore::open_in_memory().unwrap());
    let vault = PageVault::new(test_keys(3), blobs, metadata, &config).unwrap();

    vault
        .ingest(IngestRequest::new("tiny", 1, sample_png(16, 0)))
        .await
        .unwrap();
    let grant = vault.delivery_pipeline().bundle("tiny", 1, true).await.unwrap();
    assert_eq!(grant.expires_in, 300);
}

#[test]
fn vault_rejects_invalid_config() {
    let config = VaultConfig {
        sign_ttl_secs: 0,
        ..VaultConfig::default()
    };
    let blobs = CountingBlobStore::new();
    let metadata = Arc::new(DuckDbMetadataStore::open_in_memory().unwrap());
    let result = PageVault::new(test_keys(3), blobs, metadata, &config);
    assert!(matches!(result, Err(VaultError::Configuration(_))));
}
