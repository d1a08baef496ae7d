//! Encrypted credential cache.
//!
//! This module provides:
//! - The key manager: a random 256-bit key created once per installation
//! - Cipher suites for sealing the PIN (AES-256-CBC, AES-256-GCM)
//! - `SecretVault`: enrollment and verification of the PIN
//!
//! Everything is persisted through a `KeyValueStore`.

pub mod cipher;
mod codec;
pub mod error;
pub mod key;
pub mod record;
pub mod secret;

pub use cipher::CipherSuite;
pub use error::{VaultError, VaultResult};
pub use key::{get_or_create_key, load_key, VaultKey, KEY_AES};
pub use record::VaultMeta;
pub use secret::{SecretVault, KEY_IV, KEY_META, KEY_PIN};
