//! Page key wrapping under the process master key.

use crate::cipher::{self, IV_SIZE, SealedPayload, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{KEY_SIZE, MasterKey, PageKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// A page key sealed under the master key. Stored as metadata, never as a blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedPageKey {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_SIZE],
    pub tag: [u8; TAG_SIZE],
}

impl From<SealedPayload> for WrappedPageKey {
    fn from(sealed: SealedPayload) -> Self {
        Self {
            ciphertext: sealed.ciphertext,
            iv: sealed.iv,
            tag: sealed.tag,
        }
    }
}

impl WrappedPageKey {
    fn to_sealed(&self) -> SealedPayload {
        SealedPayload {
            iv: self.iv,
            tag: self.tag,
            ciphertext: self.ciphertext.clone(),
        }
    }
}

/// Wraps and unwraps page keys with the single active master key.
///
/// Holds no mutable state, so one instance is shared across all requests.
pub struct KeyHierarchy {
    master: MasterKey,
}

impl KeyHierarchy {
    pub fn new(master: MasterKey) -> Self {
        Self { master }
    }

    /// Seals `page_key` under the master key with a fresh random IV.
    pub fn wrap(&self, page_key: &PageKey) -> CryptoResult<WrappedPageKey> {
        cipher::encrypt(self.master.as_bytes(), page_key.as_bytes(), None).map(Into::into)
    }

    /// Recovers a page key.
    ///
    /// Any authentication failure (wrong master key, tampered or truncated
    /// input) is reported as [`CryptoError::KeyMismatch`].
    pub fn unwrap(&self, wrapped: &WrappedPageKey) -> CryptoResult<PageKey> {
        let plaintext = Zeroizing::new(
            cipher::decrypt(self.master.as_bytes(), &wrapped.to_sealed()).map_err(|e| match e {
                CryptoError::IntegrityFailure => CryptoError::KeyMismatch,
                other => other,
            })?,
        );

        if plaintext.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: plaintext.len(),
            });
        }
        PageKey::from_slice(&plaintext)
    }
}

impl std::fmt::Debug for KeyHierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyHierarchy").finish_non_exhaustive()
    }
}
