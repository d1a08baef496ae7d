//! SecretVault - encrypted storage for the enrolled PIN.
//!
//! The PIN is sealed under the persisted vault key with a fresh random IV on
//! every enrollment. Ciphertext, IV and metadata are written as one batch;
//! the plaintext PIN is never stored.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use super::cipher::CipherSuite;
use super::codec;
use super::error::{VaultError, VaultResult};
use super::key::{get_or_create_key, load_key, VaultKey};
use super::record::VaultMeta;
use crate::storage::KeyValueStore;

/// Store key holding the base64 ciphertext of the PIN.
pub const KEY_PIN: &str = "encrypted_pin";

/// Store key holding the base64 IV used for the current ciphertext.
pub const KEY_IV: &str = "encryption_iv";

/// Store key holding the JSON `VaultMeta` record.
pub const KEY_META: &str = "vault_meta";

pub struct SecretVault<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    /// Cipher used for new enrollments.
    cipher: CipherSuite,
}

impl<S: KeyValueStore + ?Sized> SecretVault<S> {
    pub fn new(store: Arc<S>, cipher: CipherSuite) -> Self {
        Self { store, cipher }
    }

    /// `true` iff a ciphertext is present.
    pub fn is_enrolled(&self) -> VaultResult<bool> {
        Ok(self.store.contains(KEY_PIN)?)
    }

    /// Encrypt and persist `secret`, replacing any previous enrollment.
    ///
    /// # Errors
    /// `KeyUnavailable` if the stored key is corrupt, `Encryption` if sealing
    /// fails. Nothing is written on error.
    pub fn enroll(&self, secret: &str) -> VaultResult<VaultMeta> {
        let key = get_or_create_key(&*self.store)?;

        let iv = self.cipher.generate_iv();
        let ciphertext = self.cipher.encrypt(&key, &iv, secret.as_bytes())?;
        let meta = VaultMeta::new(self.cipher, key.fingerprint());

        self.store.put_batch(&[
            (KEY_META, serde_json::to_string(&meta)?),
            (KEY_IV, codec::encode(&iv)),
            (KEY_PIN, codec::encode(&ciphertext)),
        ])?;

        info!("PIN enrolled with {}", self.cipher);
        Ok(meta)
    }

    /// Check `candidate` against the enrolled PIN.
    ///
    /// Returns `false` when nothing is enrolled or the stored ciphertext
    /// cannot be opened for any reason.
    ///
    /// # Errors
    /// Only `KeyUnavailable` (and store failures) are returned as errors.
    pub fn verify(&self, candidate: &str) -> VaultResult<bool> {
        let encrypted = self.store.get(KEY_PIN)?;
        let iv = self.store.get(KEY_IV)?;
        let (Some(encrypted), Some(iv)) = (encrypted, iv) else {
            debug!("No PIN enrolled, verification fails");
            return Ok(false);
        };

        let key = load_key(&*self.store)?.ok_or_else(|| {
            VaultError::KeyUnavailable("No key persisted for the enrolled PIN".into())
        })?;

        match self.open(&key, &encrypted, &iv) {
            Ok(plaintext) => Ok(candidate.as_bytes().ct_eq(plaintext.as_slice()).into()),
            Err(e) => {
                warn!("Stored PIN could not be opened: {}", e);
                Ok(false)
            }
        }
    }

    /// Metadata of the current enrollment, `None` if nothing is enrolled.
    pub fn metadata(&self) -> VaultResult<Option<VaultMeta>> {
        if !self.is_enrolled()? {
            return Ok(None);
        }
        self.read_meta().map(Some)
    }

    fn read_meta(&self) -> VaultResult<VaultMeta> {
        match self.store.get(KEY_META)? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| VaultError::Corrupted(format!("Invalid vault metadata: {}", e))),
            None => Ok(VaultMeta::legacy()),
        }
    }

    fn open(
        &self,
        key: &VaultKey,
        encrypted: &str,
        iv: &str,
    ) -> VaultResult<zeroize::Zeroizing<Vec<u8>>> {
        let meta = self.read_meta()?;

        if let Some(key_id) = &meta.key_id {
            if *key_id != key.fingerprint() {
                return Err(VaultError::Decryption(format!(
                    "PIN was sealed under key {}, current key is {}",
                    key_id,
                    key.fingerprint()
                )));
            }
        }

        let ciphertext = codec::decode(encrypted)
            .map_err(|e| VaultError::Corrupted(format!("Ciphertext is not valid base64: {}", e)))?;
        let iv = codec::decode(iv)
            .map_err(|e| VaultError::Corrupted(format!("IV is not valid base64: {}", e)))?;

        meta.cipher.decrypt(key, &iv, &ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::storage::MemoryStore;
    use crate::vault::key::KEY_AES;

    fn vault(cipher: CipherSuite) -> (Arc<MemoryStore>, SecretVault<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), SecretVault::new(store, cipher))
    }

    #[test]
    fn test_enroll_then_verify() {
        for cipher in [CipherSuite::Aes256Cbc, CipherSuite::Aes256Gcm] {
            let (_, vault) = vault(cipher);
            assert!(!vault.is_enrolled().unwrap());

            vault.enroll("1234").unwrap();
            assert!(vault.is_enrolled().unwrap());
            assert!(vault.verify("1234").unwrap());
            assert!(!vault.verify("0000").unwrap());
        }
    }

    #[test]
    fn test_comparison_is_exact() {
        let (_, vault) = vault(CipherSuite::Aes256Cbc);
        vault.enroll("Secret").unwrap();

        assert!(!vault.verify("secret").unwrap());
        assert!(!vault.verify("Secret ").unwrap());
        assert!(!vault.verify("Secre").unwrap());
        assert!(vault.verify("Secret").unwrap());
    }

    #[test]
    fn test_verify_without_enrollment_is_false() {
        let (store, vault) = vault(CipherSuite::Aes256Cbc);
        assert!(!vault.verify("1234").unwrap());
        // Verifying never creates a key.
        assert!(!store.contains(KEY_AES).unwrap());
    }

    #[test]
    fn test_missing_iv_is_false() {
        let (store, vault) = vault(CipherSuite::Aes256Cbc);
        vault.enroll("1234").unwrap();
        store.remove(KEY_IV).unwrap();

        assert!(!vault.verify("1234").unwrap());
    }

    #[test]
    fn test_plaintext_never_stored() {
        let (store, vault) = vault(CipherSuite::Aes256Cbc);
        vault.enroll("s3cr3t-pin").unwrap();

        for key in [KEY_PIN, KEY_IV, KEY_META, KEY_AES] {
            let value = store.get(key).unwrap().unwrap();
            assert!(!value.contains("s3cr3t-pin"));
        }
    }

    #[test]
    fn test_reenrollment_uses_fresh_iv() {
        let (store, vault) = vault(CipherSuite::Aes256Cbc);

        vault.enroll("1234").unwrap();
        let ct1 = store.get(KEY_PIN).unwrap().unwrap();
        let iv1 = store.get(KEY_IV).unwrap().unwrap();
        let key1 = store.get(KEY_AES).unwrap().unwrap();

        vault.enroll("1234").unwrap();
        let ct2 = store.get(KEY_PIN).unwrap().unwrap();
        let iv2 = store.get(KEY_IV).unwrap().unwrap();

        assert_ne!(iv1, iv2);
        assert_ne!(ct1, ct2);
        assert_eq!(store.get(KEY_AES).unwrap().unwrap(), key1);
        assert!(vault.verify("1234").unwrap());
    }

    #[test]
    fn test_tampered_ciphertext_is_false() {
        for cipher in [CipherSuite::Aes256Cbc, CipherSuite::Aes256Gcm] {
            let (store, vault) = vault(cipher);
            vault.enroll("1234").unwrap();

            let mut ct = codec::decode(&store.get(KEY_PIN).unwrap().unwrap()).unwrap();
            let last = ct.len() - 1;
            ct[last] ^= 0xFF;
            store.put(KEY_PIN, &codec::encode(&ct)).unwrap();

            assert!(!vault.verify("1234").unwrap());
        }
    }

    #[test]
    fn test_garbage_ciphertext_is_false() {
        let (store, vault) = vault(CipherSuite::Aes256Cbc);
        vault.enroll("1234").unwrap();
        store.put(KEY_PIN, "***").unwrap();

        assert!(!vault.verify("1234").unwrap());
    }

    #[test]
    fn test_corrupt_key_is_surfaced() {
        let (store, vault) = vault(CipherSuite::Aes256Cbc);
        store.put(KEY_AES, "broken").unwrap();

        assert!(matches!(
            vault.enroll("1234"),
            Err(VaultError::KeyUnavailable(_))
        ));
        assert!(!vault.is_enrolled().unwrap());
    }

    #[test]
    fn test_corrupt_key_fails_verify() {
        let (store, vault) = vault(CipherSuite::Aes256Cbc);
        vault.enroll("1234").unwrap();
        store.put(KEY_AES, "broken").unwrap();

        assert!(matches!(
            vault.verify("1234"),
            Err(VaultError::KeyUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_key_with_enrollment_is_unavailable() {
        let (store, vault) = vault(CipherSuite::Aes256Cbc);
        vault.enroll("1234").unwrap();
        store.remove(KEY_AES).unwrap();

        assert!(matches!(
            vault.verify("1234"),
            Err(VaultError::KeyUnavailable(_))
        ));
    }

    #[test]
    fn test_foreign_key_is_false() {
        let (store, vault) = vault(CipherSuite::Aes256Gcm);
        vault.enroll("1234").unwrap();
        store
            .put(KEY_AES, &codec::encode(VaultKey::generate().as_bytes()))
            .unwrap();

        assert!(!vault.verify("1234").unwrap());
    }

    #[test]
    fn test_legacy_record_without_meta() {
        let (store, vault) = vault(CipherSuite::Aes256Cbc);
        vault.enroll("1234").unwrap();
        store.remove(KEY_META).unwrap();

        let meta = vault.metadata().unwrap().unwrap();
        assert!(meta.is_legacy());
        assert!(vault.verify("1234").unwrap());
    }

    #[test]
    fn test_decrypts_with_recorded_cipher() {
        let store = Arc::new(MemoryStore::new());
        SecretVault::new(store.clone(), CipherSuite::Aes256Gcm)
            .enroll("1234")
            .unwrap();

        // A vault configured for CBC still opens the GCM record.
        let vault = SecretVault::new(store, CipherSuite::Aes256Cbc);
        assert_eq!(
            vault.metadata().unwrap().unwrap().cipher,
            CipherSuite::Aes256Gcm
        );
        assert!(vault.verify("1234").unwrap());
    }

    #[test]
    fn test_unicode_secret() {
        let (_, vault) = vault(CipherSuite::Aes256Cbc);
        vault.enroll("pässwörd-🔐").unwrap();
        assert!(vault.verify("pässwörd-🔐").unwrap());
        assert!(!vault.verify("passwörd-🔐").unwrap());
    }

    #[test]
    fn test_block_boundary_lengths() {
        for cipher in [CipherSuite::Aes256Cbc, CipherSuite::Aes256Gcm] {
            for len in [1, 15, 16, 17, 31, 32, 33, 200] {
                let secret = "7".repeat(len);
                let (_, vault) = vault(cipher);
                vault.enroll(&secret).unwrap();
                assert!(vault.verify(&secret).unwrap(), "{} with {} bytes", cipher, len);
                assert!(!vault.verify(&"7".repeat(len + 1)).unwrap());
            }
        }
    }

    fn any_cipher() -> impl Strategy<Value = CipherSuite> {
        prop_oneof![Just(CipherSuite::Aes256Cbc), Just(CipherSuite::Aes256Gcm)]
    }

    fn any_secret() -> impl Strategy<Value = String> {
        prop_oneof!["[ -~]{1,48}", "\\PC{1,64}"]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_any_secret_verifies_after_enroll(secret in any_secret(), cipher in any_cipher()) {
            let (_, vault) = vault(cipher);
            vault.enroll(&secret).unwrap();
            prop_assert!(vault.verify(&secret).unwrap());
        }

        #[test]
        fn test_other_secret_never_verifies(
            enrolled in any_secret(),
            candidate in any_secret(),
            cipher in any_cipher(),
        ) {
            prop_assume!(enrolled != candidate);
            let (_, vault) = vault(cipher);
            vault.enroll(&enrolled).unwrap();
            prop_assert!(!vault.verify(&candidate).unwrap());
        }

        #[test]
        fn test_reenroll_uses_fresh_iv(secret in any_secret(), cipher in any_cipher()) {
            let (store, vault) = vault(cipher);

            vault.enroll(&secret).unwrap();
            let first_iv = store.get(KEY_IV).unwrap();
            let first_pin = store.get(KEY_PIN).unwrap();

            vault.enroll(&secret).unwrap();
            prop_assert_ne!(store.get(KEY_IV).unwrap(), first_iv);
            prop_assert_ne!(store.get(KEY_PIN).unwrap(), first_pin);
            prop_assert!(vault.verify(&secret).unwrap());
        }
    }
}
