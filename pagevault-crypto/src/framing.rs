//! Stored blob framing: `iv(12) || tag(16) || ciphertext`.

use crate::cipher::{IV_SIZE, SealedPayload, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};

/// Bytes preceding the ciphertext in a stored blob.
pub const HEADER_SIZE: usize = IV_SIZE + TAG_SIZE;

/// Serializes a sealed page into its stored form.
pub fn encode_blob(payload: &SealedPayload) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.ciphertext.len());
    out.extend_from_slice(&payload.iv);
    out.extend_from_slice(&payload.tag);
    out.extend_from_slice(&payload.ciphertext);
    out
}

/// Parses a stored blob.
///
/// Offsets come from [`IV_SIZE`] and [`TAG_SIZE`]; anything shorter than the
/// header is rejected rather than sliced.
pub fn decode_blob(bytes: &[u8]) -> CryptoResult<SealedPayload> {
    if bytes.len() < HEADER_SIZE {
        return Err(CryptoError::MalformedFrame(format!(
            "blob is {} bytes, header alone needs {HEADER_SIZE}",
            bytes.len()
        )));
    }

    let (iv_bytes, rest) = bytes.split_at(IV_SIZE);
    let (tag_bytes, ciphertext) = rest.split_at(TAG_SIZE);

    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(iv_bytes);
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(tag_bytes);

    Ok(SealedPayload {
        iv,
        tag,
        ciphertext: ciphertext.to_vec(),
    })
}

/// Parses a stored blob and checks its header against the IV and tag
/// recorded in the page metadata.
pub fn decode_blob_checked(
    bytes: &[u8],
    expected_iv: &[u8; IV_SIZE],
    expected_tag: &[u8; TAG_SIZE],
) -> CryptoResult<SealedPayload> {
    let payload = decode_blob(bytes)?;
    if !payload.matches_header(expected_iv, expected_tag) {
        return Err(CryptoError::FrameMismatch);
    }
    Ok(payload)
}
