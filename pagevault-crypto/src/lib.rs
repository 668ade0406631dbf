//! Page encryption layer for PageVault.
//!
//! Provides per-page envelope encryption using:
//! - AES-256-GCM with a detached tag for authenticated encryption
//! - A random content key per page
//! - A single process-wide master key that wraps every page key
//!
//! # Architecture
//!
//! The encryption uses a two-tier key system:
//!
//! 1. **Master Key**: Supplied once at startup from an external secret
//!    source. It only ever encrypts page keys.
//!
//! 2. **Page Key**: A random key generated for each page image. The page
//!    key is wrapped with the master key and the wrapped form is stored as
//!    page metadata; the encrypted image is stored as a framed blob
//!    (`iv || tag || ciphertext`).
//!
//! Every IV is random and every decrypt fails closed on a tag mismatch.

mod cipher;
mod error;
mod framing;
mod key;
mod keyring;

pub use cipher::{IV_SIZE, SealedPayload, TAG_SIZE, decrypt, encrypt, generate_iv};
pub use error::{CryptoError, CryptoResult};
pub use framing::{HEADER_SIZE, decode_blob, decode_blob_checked, encode_blob};
pub use key::{KEY_SIZE, MasterKey, PageKey};
pub use keyring::{KeyHierarchy, WrappedPageKey};
