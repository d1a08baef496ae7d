//! Vault-specific error types.
//!
//! Decryption problems never leave the vault as errors: verification turns
//! them into a failed attempt. Only key and encryption failures are meant to
//! reach the caller.

use thiserror::Error;

use crate::error::PinGateError;

#[derive(Error, Debug)]
pub enum VaultError {
    /// The persisted key is missing or cannot be decoded.
    /// Nothing encrypted under it can ever be recovered.
    #[error("Key unavailable: {0}")]
    KeyUnavailable(String),

    /// Encrypting the PIN failed. Nothing was persisted; retry.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Ciphertext could not be opened (bad padding, failed tag, wrong key).
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Stored vault fields are present but malformed.
    #[error("Vault data is corrupted: {0}")]
    Corrupted(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type VaultResult<T> = std::result::Result<T, VaultError>;

impl From<PinGateError> for VaultError {
    fn from(err: PinGateError) -> Self {
        match err {
            PinGateError::KeyUnavailable(msg) => VaultError::KeyUnavailable(msg),
            PinGateError::Encryption(msg) => VaultError::Encryption(msg),
            PinGateError::Serialization(e) => VaultError::Serialization(e),
            other => VaultError::Storage(other.to_string()),
        }
    }
}

impl From<VaultError> for PinGateError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::KeyUnavailable(msg) => PinGateError::KeyUnavailable(msg),
            VaultError::Encryption(msg) => PinGateError::Encryption(msg),
            VaultError::Decryption(msg) => {
                PinGateError::Storage(format!("Vault decryption: {}", msg))
            }
            VaultError::Corrupted(msg) => {
                PinGateError::Storage(format!("Vault corrupted: {}", msg))
            }
            VaultError::Storage(msg) => PinGateError::Storage(msg),
            VaultError::Serialization(e) => PinGateError::Serialization(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_unavailable_crosses_boundary() {
        let err: PinGateError = VaultError::KeyUnavailable("bad base64".into()).into();
        assert!(matches!(err, PinGateError::KeyUnavailable(_)));
    }

    #[test]
    fn test_encryption_crosses_boundary() {
        let err: PinGateError = VaultError::Encryption("rng".into()).into();
        assert!(matches!(err, PinGateError::Encryption(_)));
    }

    #[test]
    fn test_store_error_maps_to_storage() {
        let err: VaultError = PinGateError::Storage("disk full".into()).into();
        assert!(matches!(err, VaultError::Storage(msg) if msg.contains("disk full")));
    }
}
