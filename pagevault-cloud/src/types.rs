//! Request and response shapes for ingestion and delivery.

use crate::error::{VaultError, VaultResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest accepted document id.
pub const MAX_DOCUMENT_ID_LEN: usize = 128;

/// Deterministic blob location for a page: `{document_id}/page-{page_no:04}.enc`.
pub fn page_blob_path(document_id: &str, page_no: u32) -> String {
    format!("{document_id}/page-{page_no:04}.enc")
}

/// Document ids become the first path segment of every blob, so they are
/// restricted to `[A-Za-z0-9._-]` and may not start with a dot.
pub fn validate_document_id(document_id: &str) -> VaultResult<()> {
    if document_id.is_empty() {
        return Err(VaultError::Validation("documentId is required".into()));
    }
    if document_id.len() > MAX_DOCUMENT_ID_LEN {
        return Err(VaultError::Validation(format!(
            "documentId exceeds {MAX_DOCUMENT_ID_LEN} characters"
        )));
    }
    if document_id.starts_with('.') {
        return Err(VaultError::Validation("documentId may not start with '.'".into()));
    }
    if let Some(bad) = document_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(VaultError::Validation(format!(
            "documentId contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

pub fn validate_page_no(page_no: u32) -> VaultResult<()> {
    if page_no == 0 {
        return Err(VaultError::Validation("pageNo must be >= 1".into()));
    }
    Ok(())
}

// ── Ingestion ──

/// A raw page image to encrypt and store.
#[derive(Clone, Debug)]
pub struct IngestRequest {
    pub document_id: String,
    pub page_no: u32,
    pub image_bytes: Vec<u8>,
}

impl IngestRequest {
    pub fn new(document_id: impl Into<String>, page_no: u32, image_bytes: Vec<u8>) -> Self {
        Self {
            document_id: document_id.into(),
            page_no,
            image_bytes,
        }
    }

    /// Builds a request from a base64 image, accepting either raw base64 or a
    /// `data:<mime>;base64,...` URL.
    pub fn from_base64(
        document_id: impl Into<String>,
        page_no: u32,
        encoded: &str,
    ) -> VaultResult<Self> {
        let payload = match encoded.rsplit_once(',') {
            Some((_, data)) => data,
            None => encoded,
        };
        let image_bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| VaultError::Validation(format!("image is not valid base64: {e}")))?;
        Ok(Self::new(document_id, page_no, image_bytes))
    }
}

/// Result of a successful ingestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceipt {
    pub ok: bool,
    pub blob_path: String,
}

// ── Delivery ──

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Decrypt server-side and return image bytes.
    Stream,
    /// Return a signed blob URL plus the page key for client-side decryption.
    Bundle,
}

/// A request to read one page.
///
/// `authorized` is the verdict of the caller's external auth check; it is
/// evaluated before any storage access.
#[derive(Clone, Debug)]
pub struct DeliveryRequest {
    pub document_id: String,
    pub page_no: u32,
    pub authorized: bool,
    pub mode: DeliveryMode,
}

/// Decrypted page bytes for direct delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageStream {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub cache_control: &'static str,
}

/// Capability grant returned in bundle mode.
///
/// This hands the unwrapped page key to an already-authorized caller so it
/// can decrypt the blob itself. The key stays usable after the URL expires;
/// every grant is logged on the `pagevault::audit` target.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyGrant {
    pub url: String,
    /// Page key, standard base64.
    pub key: String,
    /// Content IV, standard base64.
    pub iv: String,
    /// Content tag, standard base64.
    pub tag: String,
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for KeyGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGrant")
            .field("url", &self.url)
            .field("key", &"[REDACTED]")
            .field("iv", &self.iv)
            .field("tag", &self.tag)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Outcome of a delivery, one variant per [`DeliveryMode`].
#[derive(Debug)]
pub enum Delivery {
    Stream(PageStream),
    Bundle(KeyGrant),
}

/// Content type from the image's magic bytes.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}
