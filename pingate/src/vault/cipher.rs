//! Block cipher modes used to seal the PIN.
//!
//! - `Aes256Cbc`: AES-256-CBC with PKCS#7 padding and a 16-byte IV. This is
//!   the legacy format and the default. It has no integrity tag, so a
//!   tampered ciphertext is indistinguishable from a wrong PIN.
//! - `Aes256Gcm`: AES-256-GCM with a 12-byte nonce and a 16-byte tag.

use aes::Aes256;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::error::{VaultError, VaultResult};
use super::key::VaultKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// IV size for CBC (one AES block, 128 bits)
const CBC_IV_SIZE: usize = 16;

/// Nonce size for AES-GCM (96 bits)
const GCM_NONCE_SIZE: usize = 12;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherSuite {
    #[default]
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

impl CipherSuite {
    /// Algorithm id as written into the vault metadata.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Aes256Cbc => "aes-256-cbc",
            Self::Aes256Gcm => "aes-256-gcm",
        }
    }

    pub fn iv_len(&self) -> usize {
        match self {
            Self::Aes256Cbc => CBC_IV_SIZE,
            Self::Aes256Gcm => GCM_NONCE_SIZE,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Aes256Gcm)
    }

    /// Fresh random IV of the right length. Never reuse one.
    pub fn generate_iv(&self) -> Vec<u8> {
        let mut iv = vec![0u8; self.iv_len()];
        rand::rng().fill_bytes(&mut iv);
        iv
    }

    pub fn encrypt(&self, key: &VaultKey, iv: &[u8], plaintext: &[u8]) -> VaultResult<Vec<u8>> {
        if iv.len() != self.iv_len() {
            return Err(VaultError::Encryption(format!(
                "Invalid IV length for {}: {}",
                self,
                iv.len()
            )));
        }

        match self {
            Self::Aes256Cbc => {
                let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv)
                    .map_err(|e| VaultError::Encryption(format!("Invalid key or IV: {}", e)))?;
                Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
            }
            Self::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
                    .map_err(|e| VaultError::Encryption(format!("Invalid key: {}", e)))?;
                cipher
                    .encrypt(Nonce::from_slice(iv), plaintext)
                    .map_err(|e| VaultError::Encryption(format!("AES-GCM encryption failed: {}", e)))
            }
        }
    }

    /// Open a ciphertext. The plaintext buffer is zeroized on drop.
    pub fn decrypt(
        &self,
        key: &VaultKey,
        iv: &[u8],
        ciphertext: &[u8],
    ) -> VaultResult<Zeroizing<Vec<u8>>> {
        if iv.len() != self.iv_len() {
            return Err(VaultError::Decryption(format!(
                "Invalid IV length for {}: {}",
                self,
                iv.len()
            )));
        }

        let plaintext = match self {
            Self::Aes256Cbc => {
                let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
                    .map_err(|e| VaultError::Decryption(format!("Invalid key or IV: {}", e)))?;
                cipher
                    .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                    .map_err(|_| VaultError::Decryption("Bad padding".into()))?
            }
            Self::Aes256Gcm => {
                let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
                    .map_err(|e| VaultError::Decryption(format!("Invalid key: {}", e)))?;
                cipher
                    .decrypt(Nonce::from_slice(iv), ciphertext)
                    .map_err(|_| VaultError::Decryption("Authentication tag mismatch".into()))?
            }
        };

        Ok(Zeroizing::new(plaintext))
    }
}

impl std::fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
