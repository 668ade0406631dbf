//! AES-256-GCM with a detached tag.
//!
//! Pages and wrapped keys are both sealed with this codec: a 96-bit IV,
//! a 128-bit tag and a ciphertext of the same length as the plaintext.
//! No associated data is bound, so a client holding the page key can
//! decrypt with any stock AES-GCM implementation.

use crate::error::{CryptoError, CryptoResult};
use crate::key::KEY_SIZE;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// AES-GCM IV size in bytes.
pub const IV_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Output of one AEAD encryption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    pub iv: [u8; IV_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// True if this payload carries exactly the given IV and tag.
    pub fn matches_header(&self, iv: &[u8; IV_SIZE], tag: &[u8; TAG_SIZE]) -> bool {
        self.iv == *iv && self.tag == *tag
    }
}

/// Returns a fresh random IV.
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::rng().fill_bytes(&mut iv);
    iv
}

fn build_cipher(key: &[u8; KEY_SIZE]) -> CryptoResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// Encrypts `plaintext` under `key`.
///
/// When `iv` is `None` a random IV is generated. Callers must never pass the
/// same IV twice for one key; every fresh encryption in this crate lets the
/// codec pick.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    plaintext: &[u8],
    iv: Option<[u8; IV_SIZE]>,
) -> CryptoResult<SealedPayload> {
    let cipher = build_cipher(key)?;
    let iv = iv.unwrap_or_else(generate_iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| {
            buffer.zeroize();
            CryptoError::Encryption(e.to_string())
        })?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(SealedPayload {
        iv,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

/// Decrypts a sealed payload.
///
/// Fails with [`CryptoError::IntegrityFailure`] on any tag mismatch; the
/// working buffer is wiped before returning so no partial plaintext escapes.
pub fn decrypt(key: &[u8; KEY_SIZE], payload: &SealedPayload) -> CryptoResult<Vec<u8>> {
    let cipher = build_cipher(key)?;

    let mut buffer = payload.ciphertext.clone();
    match cipher.decrypt_in_place_detached(
        Nonce::from_slice(&payload.iv),
        b"",
        &mut buffer,
        Tag::from_slice(&payload.tag),
    ) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(CryptoError::IntegrityFailure)
        }
    }
}
