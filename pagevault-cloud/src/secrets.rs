//! Master key loading at process start.
//!
//! A missing or malformed master key is a configuration error: callers are
//! expected to abort startup rather than serve without one.

use crate::error::{VaultError, VaultResult};
use pagevault_crypto::{KeyHierarchy, MasterKey};

/// Supplies the 32-byte master key.
pub trait SecretProvider: Send + Sync {
    fn master_key(&self) -> VaultResult<MasterKey>;
}

/// Reads a standard-base64 master key from an environment variable.
pub struct EnvSecretProvider {
    var: String,
}

impl EnvSecretProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl SecretProvider for EnvSecretProvider {
    fn master_key(&self) -> VaultResult<MasterKey> {
        let encoded = std::env::var(&self.var)
            .map_err(|_| VaultError::Configuration(format!("{} is not set", self.var)))?;
        MasterKey::from_base64(&encoded)
            .map_err(|e| VaultError::Configuration(format!("{}: {e}", self.var)))
    }
}

/// Hands out a key that was already loaded elsewhere (raw bytes).
pub struct StaticSecretProvider {
    bytes: zeroize::Zeroizing<Vec<u8>>,
}

impl StaticSecretProvider {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: zeroize::Zeroizing::new(bytes),
        }
    }
}

impl SecretProvider for StaticSecretProvider {
    fn master_key(&self) -> VaultResult<MasterKey> {
        MasterKey::from_slice(&self.bytes)
            .map_err(|e| VaultError::Configuration(format!("master key: {e}")))
    }
}

/// Loads the master key once and builds the shared key hierarchy.
pub fn load_key_hierarchy(provider: &dyn SecretProvider) -> VaultResult<KeyHierarchy> {
    let master = provider.master_key()?;
    tracing::info!("master key loaded");
    Ok(KeyHierarchy::new(master))
}
