use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::NotificationResult;
use crate::models::{NewProviderConfig, ProviderConfig};

/// Access to the persisted provider configuration.
///
/// Implementations must keep at most one row active.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderConfigRepository: Send + Sync {
    /// The row currently flagged active, if any
    async fn find_active(&self) -> NotificationResult<Option<ProviderConfig>>;

    /// Deactivate every existing row and store `input` as the active one
    async fn save_active(&self, input: NewProviderConfig) -> NotificationResult<ProviderConfig>;
}

/// Key-value persistence for the encoded master key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MasterKeyStore: Send + Sync {
    /// The stored key, base64-encoded
    async fn load_master_key(&self) -> NotificationResult<Option<String>>;

    /// Store `encoded` unless a key already exists.
    ///
    /// Returns the key that is persisted afterwards, which is the existing one
    /// when another writer got there first.
    async fn create_master_key_if_absent(&self, encoded: &str) -> NotificationResult<String>;
}

/// In-memory implementation of ProviderConfigRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProviderConfigRepository {
    rows: Arc<RwLock<Vec<ProviderConfig>>>,
}

impl InMemoryProviderConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, active or not.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl ProviderConfigRepository for InMemoryProviderConfigRepository {
    async fn find_active(&self) -> NotificationResult<Option<ProviderConfig>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.is_active).cloned())
    }

    async fn save_active(&self, input: NewProviderConfig) -> NotificationResult<ProviderConfig> {
        let mut rows = self.rows.write().await;
        for row in rows.iter_mut() {
            row.is_active = false;
        }

        let config = ProviderConfig::from_new(input);
        rows.push(config.clone());

        tracing::info!(config_id = %config.id, provider = %config.provider, "Activated email provider config");
        Ok(config)
    }
}

/// In-memory implementation of MasterKeyStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryMasterKeyStore {
    key: Arc<RwLock<Option<String>>>,
}

impl InMemoryMasterKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `encoded`.
    pub fn with_key(encoded: impl Into<String>) -> Self {
        Self {
            key: Arc::new(RwLock::new(Some(encoded.into()))),
        }
    }
}

#[async_trait]
impl MasterKeyStore for InMemoryMasterKeyStore {
    async fn load_master_key(&self) -> NotificationResult<Option<String>> {
        Ok(self.key.read().await.clone())
    }

    async fn create_master_key_if_absent(&self, encoded: &str) -> NotificationResult<String> {
        let mut key = self.key.write().await;
        Ok(key.get_or_insert_with(|| encoded.to_string()).clone())
    }
}
