//! Page metadata: the typed record and its persisted base64 form.

use crate::error::{StorageError, StorageResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use pagevault_crypto::{IV_SIZE, KEY_SIZE, TAG_SIZE, WrappedPageKey};
use serde::{Deserialize, Serialize};

/// Everything needed to locate and decrypt one page.
///
/// One record exists per `(document_id, page_no)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageMetadata {
    pub document_id: String,
    pub page_no: u32,
    pub blob_path: String,
    pub content_iv: [u8; IV_SIZE],
    pub content_tag: [u8; TAG_SIZE],
    pub wrapped_key: WrappedPageKey,
}

/// Persisted layout of [`PageMetadata`], binary fields as standard base64.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub document_id: String,
    pub page_no: u32,
    pub blob_path: String,
    pub content_iv: String,
    pub content_tag: String,
    pub wrapped_key: String,
    pub wrap_iv: String,
    pub wrap_tag: String,
}

impl From<&PageMetadata> for PageRecord {
    fn from(meta: &PageMetadata) -> Self {
        Self {
            document_id: meta.document_id.clone(),
            page_no: meta.page_no,
            blob_path: meta.blob_path.clone(),
            content_iv: BASE64.encode(meta.content_iv),
            content_tag: BASE64.encode(meta.content_tag),
            wrapped_key: BASE64.encode(&meta.wrapped_key.ciphertext),
            wrap_iv: BASE64.encode(meta.wrapped_key.iv),
            wrap_tag: BASE64.encode(meta.wrapped_key.tag),
        }
    }
}

impl TryFrom<PageRecord> for PageMetadata {
    type Error = StorageError;

    fn try_from(record: PageRecord) -> StorageResult<Self> {
        let corrupt = |reason: String| StorageError::CorruptRecord {
            document_id: record.document_id.clone(),
            page_no: record.page_no,
            reason,
        };

        let content_iv = decode_fixed::<IV_SIZE>("contentIv", &record.content_iv).map_err(corrupt)?;
        let content_tag =
            decode_fixed::<TAG_SIZE>("contentTag", &record.content_tag).map_err(corrupt)?;
        let wrap_iv = decode_fixed::<IV_SIZE>("wrapIv", &record.wrap_iv).map_err(corrupt)?;
        let wrap_tag = decode_fixed::<TAG_SIZE>("wrapTag", &record.wrap_tag).map_err(corrupt)?;
        let wrapped = BASE64
            .decode(&record.wrapped_key)
            .map_err(|e| corrupt(format!("wrappedKey is not base64: {e}")))?;
        if wrapped.len() != KEY_SIZE {
            return Err(corrupt(format!(
                "wrappedKey is {} bytes, expected {KEY_SIZE}",
                wrapped.len()
            )));
        }

        Ok(Self {
            document_id: record.document_id,
            page_no: record.page_no,
            blob_path: record.blob_path,
            content_iv,
            content_tag,
            wrapped_key: WrappedPageKey {
                ciphertext: wrapped,
                iv: wrap_iv,
                tag: wrap_tag,
            },
        })
    }
}

fn decode_fixed<const N: usize>(field: &str, encoded: &str) -> Result<[u8; N], String> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| format!("{field} is not base64: {e}"))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| format!("{field} is {len} bytes, expected {N}"))
}
