//! Typed metadata stored next to the encrypted PIN.
//!
//! `vault_meta` records which cipher sealed the PIN and which key it was
//! sealed under, so the format can move to another algorithm without
//! breaking existing vaults. Records written before this field existed are
//! read as format version 1 with AES-256-CBC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cipher::CipherSuite;

/// Version written by current enrollments.
pub const CURRENT_FORMAT_VERSION: u32 = 2;

/// Version assumed when no metadata is stored.
pub const LEGACY_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMeta {
    pub format_version: u32,
    pub cipher: CipherSuite,
    /// Fingerprint of the key that sealed the PIN. Absent in legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl VaultMeta {
    pub fn new(cipher: CipherSuite, key_id: String) -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            cipher,
            key_id: Some(key_id),
            enrolled_at: Some(Utc::now()),
        }
    }

    pub fn legacy() -> Self {
        Self {
            format_version: LEGACY_FORMAT_VERSION,
            cipher: CipherSuite::Aes256Cbc,
            key_id: None,
            enrolled_at: None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.format_version == LEGACY_FORMAT_VERSION
    }
}
