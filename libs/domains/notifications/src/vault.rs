//! Credential vault for provider secrets stored at rest.
//!
//! Secrets are sealed with AES-256-GCM under a single process-wide master key.
//! Ciphertext layout: `base64(nonce[12] || ciphertext || tag[16])`.
//!
//! The master key is read from `WULFVAULT_MASTER_KEY` when set, otherwise it
//! is loaded from (or lazily created in) the [`MasterKeyStore`].

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{NotificationError, NotificationResult};
use crate::repository::MasterKeyStore;

/// Environment variable that overrides the stored master key.
pub const MASTER_KEY_ENV: &str = "WULFVAULT_MASTER_KEY";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// 256-bit symmetric key protecting provider secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key.as_slice());
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> NotificationResult<Self> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            NotificationError::Decryption(format!(
                "master key must be {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Decode a base64-encoded key as stored or supplied via the environment.
    pub fn from_base64(encoded: &str) -> NotificationResult<Self> {
        let bytes = BASE64.decode(encoded.trim()).map_err(|e| {
            NotificationError::Decryption(format!("master key is not valid base64: {}", e))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Key supplied through [`MASTER_KEY_ENV`], if any.
    pub fn from_env() -> NotificationResult<Option<Self>> {
        match std::env::var(MASTER_KEY_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::from_base64(&value).map(Some),
            _ => Ok(None),
        }
    }

    fn cipher(&self) -> NotificationResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| NotificationError::Decryption(format!("invalid master key: {}", e)))
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// Seal `plaintext` under `key`. A fresh nonce is drawn for every call.
pub fn encrypt_secret(plaintext: &str, key: &MasterKey) -> NotificationResult<String> {
    let cipher = key.cipher()?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| NotificationError::Decryption(format!("failed to encrypt secret: {}", e)))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + sealed.len());
    combined.extend_from_slice(&nonce);
    combined.extend_from_slice(&sealed);
    Ok(BASE64.encode(&combined))
}

/// Open a secret produced by [`encrypt_secret`].
///
/// Fails with [`NotificationError::Decryption`] on malformed input or when the
/// authentication tag does not verify under `key`.
pub fn decrypt_secret(ciphertext: &str, key: &MasterKey) -> NotificationResult<String> {
    let combined = BASE64.decode(ciphertext.trim()).map_err(|e| {
        NotificationError::Decryption(format!("stored secret is not valid base64: {}", e))
    })?;

    if combined.len() < NONCE_LEN + TAG_LEN {
        return Err(NotificationError::Decryption(format!(
            "stored secret is too short ({} bytes)",
            combined.len()
        )));
    }

    let (nonce, sealed) = combined.split_at(NONCE_LEN);
    let plaintext = key
        .cipher()?
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| {
            NotificationError::Decryption(
                "stored secret is corrupt or was sealed with a different master key".to_string(),
            )
        })?;

    String::from_utf8(plaintext).map_err(|e| {
        NotificationError::Decryption(format!("decrypted secret is not UTF-8: {}", e))
    })
}

/// Return the persisted master key, creating and storing one on first use.
pub async fn get_or_create_master_key(store: &dyn MasterKeyStore) -> NotificationResult<MasterKey> {
    if let Some(encoded) = store.load_master_key().await? {
        return MasterKey::from_base64(&encoded);
    }

    let candidate = MasterKey::generate().to_base64();
    let stored = store.create_master_key_if_absent(&candidate).await?;
    if stored == candidate {
        info!("Generated new email master key");
    } else {
        debug!("Master key was created concurrently, using the stored one");
    }
    MasterKey::from_base64(&stored)
}

/// Resolves the master key for the selector and admin tooling.
#[derive(Clone)]
pub struct CredentialVault {
    store: Arc<dyn MasterKeyStore>,
    env_key: Option<MasterKey>,
}

impl CredentialVault {
    pub fn new(store: Arc<dyn MasterKeyStore>) -> Self {
        Self {
            store,
            env_key: None,
        }
    }

    /// A vault that prefers `key` over whatever the store holds.
    pub fn with_key(store: Arc<dyn MasterKeyStore>, key: MasterKey) -> Self {
        Self {
            store,
            env_key: Some(key),
        }
    }

    /// A vault honoring [`MASTER_KEY_ENV`] when it is set.
    pub fn from_env(store: Arc<dyn MasterKeyStore>) -> NotificationResult<Self> {
        Ok(Self {
            store,
            env_key: MasterKey::from_env()?,
        })
    }

    pub async fn master_key(&self) -> NotificationResult<MasterKey> {
        match &self.env_key {
            Some(key) => Ok(key.clone()),
            None => get_or_create_master_key(self.store.as_ref()).await,
        }
    }

    pub async fn encrypt(&self, plaintext: &str) -> NotificationResult<String> {
        let key = self.master_key().await?;
        encrypt_secret(plaintext, &key)
    }

    pub async fn decrypt(&self, ciphertext: &str) -> NotificationResult<String> {
        let key = self.master_key().await?;
        decrypt_secret(ciphertext, &key)
    }
}

impl fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVault")
            .field("env_key", &self.env_key.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryMasterKeyStore, MockMasterKeyStore};

    #[test]
    fn test_encrypt_then_decrypt_returns_secret() {
        let key = MasterKey::generate();
        for secret in ["SG.abc123", "", "lösenord med mellanslag", "key-3f9a\n"] {
            let sealed = encrypt_secret(secret, &key).unwrap();
            assert_ne!(sealed, secret);
            assert_eq!(decrypt_secret(&sealed, &key).unwrap(), secret);
        }
    }

    #[test]
    fn test_same_plaintext_gives_distinct_ciphertexts() {
        let key = MasterKey::generate();
        let a = encrypt_secret("api-key", &key).unwrap();
        let b = encrypt_secret("api-key", &key).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_mismatched_key_fails() {
        let sealed = encrypt_secret("xkeysib-secret", &MasterKey::generate()).unwrap();
        let result = decrypt_secret(&sealed, &MasterKey::generate());
        assert!(matches!(result, Err(NotificationError::Decryption(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = MasterKey::generate();
        let sealed = encrypt_secret("secret", &key).unwrap();
        let mut bytes = BASE64.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let result = decrypt_secret(&BASE64.encode(bytes), &key);
        assert!(matches!(result, Err(NotificationError::Decryption(_))));
    }

    #[test]
    fn test_malformed_ciphertext_fails() {
        let key = MasterKey::generate();
        assert!(matches!(
            decrypt_secret("not base64 !!", &key),
            Err(NotificationError::Decryption(_))
        ));
        assert!(matches!(
            decrypt_secret(&BASE64.encode([0u8; 8]), &key),
            Err(NotificationError::Decryption(_))
        ));
    }

    #[test]
    fn test_master_key_base64_round_trip_and_length_check() {
        let key = MasterKey::generate();
        assert_eq!(MasterKey::from_base64(&key.to_base64()).unwrap(), key);

        let short = BASE64.encode([7u8; 16]);
        assert!(matches!(
            MasterKey::from_base64(&short),
            Err(NotificationError::Decryption(_))
        ));
        assert_eq!(format!("{:?}", key), "MasterKey(<redacted>)");
    }

    #[test]
    fn test_master_key_from_env() {
        let key = MasterKey::generate();
        temp_env::with_var(MASTER_KEY_ENV, Some(key.to_base64()), || {
            assert_eq!(MasterKey::from_env().unwrap(), Some(key.clone()));
        });
        temp_env::with_var_unset(MASTER_KEY_ENV, || {
            assert_eq!(MasterKey::from_env().unwrap(), None);
        });
        temp_env::with_var(MASTER_KEY_ENV, Some("short"), || {
            assert!(MasterKey::from_env().is_err());
        });
    }

    #[tokio::test]
    async fn test_get_or_create_persists_once() {
        let store = InMemoryMasterKeyStore::new();

        let first = get_or_create_master_key(&store).await.unwrap();
        let second = get_or_create_master_key(&store).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            store.load_master_key().await.unwrap(),
            Some(first.to_base64())
        );
    }

    #[tokio::test]
    async fn test_get_or_create_adopts_concurrently_created_key() {
        let winner = MasterKey::generate();
        let winner_encoded = winner.to_base64();

        let mut store = MockMasterKeyStore::new();
        store.expect_load_master_key().times(1).returning(|| Ok(None));
        store
            .expect_create_master_key_if_absent()
            .times(1)
            .returning(move |_| Ok(winner_encoded.clone()));

        let key = get_or_create_master_key(&store).await.unwrap();
        assert_eq!(key, winner);
    }

    #[tokio::test]
    async fn test_get_or_create_propagates_storage_failure() {
        let mut store = MockMasterKeyStore::new();
        store.expect_load_master_key().returning(|| Ok(None));
        store
            .expect_create_master_key_if_absent()
            .returning(|_| Err(NotificationError::Storage("disk full".to_string())));

        let result = get_or_create_master_key(&store).await;
        assert!(matches!(result, Err(NotificationError::Storage(_))));
    }

    #[tokio::test]
    async fn test_vault_prefers_supplied_key() {
        let store = Arc::new(InMemoryMasterKeyStore::new());
        let key = MasterKey::generate();
        let vault = CredentialVault::with_key(store.clone(), key.clone());

        let sealed = vault.encrypt("password").await.unwrap();
        assert_eq!(decrypt_secret(&sealed, &key).unwrap(), "password");
        assert_eq!(vault.decrypt(&sealed).await.unwrap(), "password");
        assert!(store.load_master_key().await.unwrap().is_none());
    }
}
