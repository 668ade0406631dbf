//! S3 upload/download and URL signing for encrypted page blobs.
//!
//! PutObject replaces an object atomically, so a failed upload never leaves
//! a partial blob behind.

use crate::blob_store::BlobStore;
use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use std::time::Duration;
use tracing::{debug, info};

/// S3-backed [`BlobStore`].
pub struct S3Transport {
    client: S3Client,
    bucket: String,
    region: String,
}

impl S3Transport {
    /// Builds a client from the config: static credentials when both halves
    /// are set, otherwise the default AWS credential chain.
    pub async fn connect(config: &VaultConfig) -> VaultResult<Self> {
        config.validate()?;

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_types::region::Region::new(config.s3_region.clone()))
            .load()
            .await;

        let mut config_builder = aws_sdk_s3::config::Builder::from(&shared);

        if let (Some(access_key_id), Some(secret)) =
            (&config.s3_access_key_id, &config.s3_secret_access_key)
        {
            let credentials = aws_credential_types::Credentials::new(
                access_key_id,
                secret,
                None,
                None,
                "pagevault-static",
            );
            config_builder = config_builder.credentials_provider(credentials);
        }

        if let Some(ref endpoint) = config.s3_endpoint_override {
            config_builder = config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        Ok(Self::from_client(
            S3Client::from_conf(config_builder.build()),
            config.s3_bucket.clone(),
            config.s3_region.clone(),
        ))
    }

    pub fn from_client(client: S3Client, bucket: String, region: String) -> Self {
        Self {
            client,
            bucket,
            region,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Creates the private page bucket if it does not exist yet.
    ///
    /// Returns `true` when the bucket was created by this call.
    pub async fn ensure_bucket(&self) -> VaultResult<bool> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                debug!(bucket = %self.bucket, "bucket exists");
                return Ok(false);
            }
            Err(e) => {
                let service_err = e.into_service_error();
                if !service_err.is_not_found() {
                    return Err(VaultError::Storage(format!(
                        "head bucket failed for {}: {service_err}",
                        self.bucket
                    )));
                }
            }
        }

        let mut request = self.client.create_bucket().bucket(&self.bucket);
        // us-east-1 rejects an explicit location constraint.
        if self.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| VaultError::Storage(format!("create bucket {} failed: {e}", self.bucket)))?;

        info!(bucket = %self.bucket, "bucket created");
        Ok(true)
    }
}

#[async_trait]
impl BlobStore for S3Transport {
    async fn put(&self, path: &str, bytes: Vec<u8>) -> VaultResult<()> {
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type("application/octet-stream")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| VaultError::Storage(format!("upload failed for {path}: {e}")))?;

        debug!("uploaded {size} bytes to s3://{}/{path}", self.bucket);
        Ok(())
    }

    async fn get(&self, path: &str) -> VaultResult<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    VaultError::Storage(format!("blob missing at {path}"))
                } else {
                    VaultError::Storage(format!("download failed for {path}: {service_err}"))
                }
            })?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| VaultError::Storage(format!("failed to read body for {path}: {e}")))?;

        let bytes = body.into_bytes().to_vec();
        debug!(
            "downloaded {} bytes from s3://{}/{path}",
            bytes.len(),
            self.bucket
        );
        Ok(bytes)
    }

    async fn sign_url(&self, path: &str, ttl: Duration) -> VaultResult<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| VaultError::Configuration(format!("invalid signed URL ttl: {e}")))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(presigning)
            .await
            .map_err(|e| VaultError::Storage(format!("signing failed for {path}: {e}")))?;

        Ok(request.uri().to_string())
    }
}
