//! Key manager for the vault encryption key.
//!
//! The key is a random 256-bit value generated on first use and persisted
//! under `aes_key`. It is never regenerated while present: every PIN
//! encrypted so far depends on it.

use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::codec;
use super::error::{VaultError, VaultResult};
use crate::storage::KeyValueStore;

/// Store key holding the base64 key material.
pub const KEY_AES: &str = "aes_key";

/// Key size in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// A 256-bit encryption key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    key: [u8; KEY_SIZE],
}

impl VaultKey {
    /// Generate a fresh key from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut key);
        Self { key }
    }

    pub fn from_slice(slice: &[u8]) -> VaultResult<Self> {
        if slice.len() != KEY_SIZE {
            return Err(VaultError::KeyUnavailable(format!(
                "Invalid key size: expected {} bytes, got {}",
                KEY_SIZE,
                slice.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(slice);
        Ok(Self { key })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Short identifier of the key: hex of the first 8 bytes of SHA-256.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key);
        hex::encode(&digest[..8])
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("key", &"[REDACTED]")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Load the persisted key without creating one.
///
/// # Errors
/// `KeyUnavailable` if the stored encoding is corrupt or has the wrong size.
pub fn load_key<S: KeyValueStore + ?Sized>(store: &S) -> VaultResult<Option<VaultKey>> {
    let Some(encoded) = store.get(KEY_AES)? else {
        return Ok(None);
    };

    let mut bytes = codec::decode(&encoded)
        .map_err(|e| VaultError::KeyUnavailable(format!("Stored key is not valid base64: {}", e)))?;
    let key = VaultKey::from_slice(&bytes);
    bytes.zeroize();

    key.map(Some)
}

/// Get the persisted key, or generate and persist one on first use.
///
/// Subsequent calls, including after a restart, return the same key.
///
/// # Errors
/// `KeyUnavailable` if a key is stored but cannot be decoded. The caller
/// must not fall back to a new key in that case.
pub fn get_or_create_key<S: KeyValueStore + ?Sized>(store: &S) -> VaultResult<VaultKey> {
    if let Some(key) = load_key(store)? {
        debug!("Loaded vault key {}", key.fingerprint());
        return Ok(key);
    }

    let key = VaultKey::generate();
    store.put(KEY_AES, &codec::encode(key.as_bytes()))?;

    info!("Generated new vault key {}", key.fingerprint());
    Ok(key)
}
