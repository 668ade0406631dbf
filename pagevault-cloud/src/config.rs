//! Page vault configuration.

use crate::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Shortest validity of a signed URL.
pub const MIN_SIGN_TTL_SECS: u64 = 1;

/// Longest validity S3 accepts for a presigned URL (7 days).
pub const MAX_SIGN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration for the page vault.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultConfig {
    /// S3 bucket holding encrypted page blobs.
    pub s3_bucket: String,

    /// AWS region for S3.
    pub s3_region: String,

    /// Optional S3 endpoint override (for MinIO in testing).
    pub s3_endpoint_override: Option<String>,

    /// Static access key; the default AWS credential chain is used when unset.
    pub s3_access_key_id: Option<String>,

    #[serde(skip_serializing)]
    pub s3_secret_access_key: Option<String>,

    /// Validity window of signed blob URLs handed out in bundle mode (seconds).
    pub sign_ttl_secs: u64,

    /// Smallest page image accepted for ingestion (bytes).
    pub min_page_bytes: usize,

    /// DuckDB file for page metadata. In-memory when unset.
    pub metadata_db_path: Option<PathBuf>,

    /// Environment variable holding the base64 master key.
    pub master_key_env: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            s3_bucket: "pagevault-pages".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint_override: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
            sign_ttl_secs: 60,
            min_page_bytes: 1024,
            metadata_db_path: None,
            master_key_env: "MASTER_KEY_BASE64".to_string(),
        }
    }
}

impl VaultConfig {
    /// Defaults overlaid with `PAGEVAULT_*` environment variables.
    pub fn from_env() -> VaultResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`VaultConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> VaultResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(bucket) = get("PAGEVAULT_S3_BUCKET") {
            config.s3_bucket = bucket;
        }
        if let Some(region) = get("PAGEVAULT_S3_REGION") {
            config.s3_region = region;
        }
        if let Some(endpoint) = get("PAGEVAULT_S3_ENDPOINT") {
            config.s3_endpoint_override = Some(endpoint);
        }
        config.s3_access_key_id = get("PAGEVAULT_S3_ACCESS_KEY_ID");
        config.s3_secret_access_key = get("PAGEVAULT_S3_SECRET_ACCESS_KEY");
        if let Some(ttl) = get("PAGEVAULT_SIGN_TTL") {
            config.sign_ttl_secs = parse_var("PAGEVAULT_SIGN_TTL", &ttl)?;
        }
        if let Some(min) = get("PAGEVAULT_MIN_PAGE_BYTES") {
            config.min_page_bytes = parse_var("PAGEVAULT_MIN_PAGE_BYTES", &min)?;
        }
        if let Some(path) = get("PAGEVAULT_METADATA_DB") {
            config.metadata_db_path = Some(PathBuf::from(path));
        }
        if let Some(var) = get("PAGEVAULT_MASTER_KEY_ENV") {
            config.master_key_env = var;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the pipelines cannot run with.
    pub fn validate(&self) -> VaultResult<()> {
        if self.s3_bucket.trim().is_empty() {
            return Err(VaultError::Configuration("s3_bucket is empty".into()));
        }
        if !(MIN_SIGN_TTL_SECS..=MAX_SIGN_TTL_SECS).contains(&self.sign_ttl_secs) {
            return Err(VaultError::Configuration(format!(
                "sign_ttl_secs must be between {MIN_SIGN_TTL_SECS} and {MAX_SIGN_TTL_SECS}"
            )));
        }
        if self.min_page_bytes == 0 {
            return Err(VaultError::Configuration("min_page_bytes must be positive".into()));
        }
        if self.s3_access_key_id.is_some() != self.s3_secret_access_key.is_some() {
            return Err(VaultError::Configuration(
                "s3 access key id and secret must be set together".into(),
            ));
        }
        Ok(())
    }

    /// Creates a config for testing with MinIO.
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            s3_bucket: "pagevault-test".to_string(),
            s3_endpoint_override: Some("http://localhost:9000".to_string()),
            s3_access_key_id: Some("pagevault-test".to_string()),
            s3_secret_access_key: Some("pagevault-test-secret".to_string()),
            min_page_bytes: 16,
            ..Self::default()
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> VaultResult<T> {
    value
        .parse()
        .map_err(|_| VaultError::Configuration(format!("{name} is not a valid number: {value:?}")))
}
