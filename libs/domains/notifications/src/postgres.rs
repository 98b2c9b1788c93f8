use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

use crate::{
    entity::{app_setting, provider_config},
    error::{NotificationError, NotificationResult},
    models::{NewProviderConfig, ProviderConfig},
    repository::{MasterKeyStore, ProviderConfigRepository},
};

pub struct PgProviderConfigRepository {
    db: DatabaseConnection,
}

impl PgProviderConfigRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProviderConfigRepository for PgProviderConfigRepository {
    async fn find_active(&self) -> NotificationResult<Option<ProviderConfig>> {
        let model = provider_config::Entity::find()
            .filter(provider_config::Column::IsActive.eq(true))
            .order_by_desc(provider_config::Column::UpdatedAt)
            .one(&self.db)
            .await?;

        model.map(ProviderConfig::try_from).transpose()
    }

    async fn save_active(&self, input: NewProviderConfig) -> NotificationResult<ProviderConfig> {
        let txn = self.db.begin().await?;

        // Deactivate and insert in one transaction so readers never see two active rows
        let deactivated = provider_config::Entity::update_many()
            .col_expr(provider_config::Column::IsActive, Expr::value(false))
            .col_expr(
                provider_config::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(provider_config::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        let active_model: provider_config::ActiveModel = input.into();
        let model = active_model.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            config_id = %model.id,
            provider = %model.provider,
            deactivated = deactivated.rows_affected,
            "Activated email provider config"
        );
        ProviderConfig::try_from(model)
    }
}

pub struct PgMasterKeyStore {
    db: DatabaseConnection,
}

impl PgMasterKeyStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MasterKeyStore for PgMasterKeyStore {
    async fn load_master_key(&self) -> NotificationResult<Option<String>> {
        let setting = app_setting::Entity::find_by_id(app_setting::EMAIL_MASTER_KEY.to_string())
            .one(&self.db)
            .await?;

        Ok(setting.map(|s| s.value))
    }

    async fn create_master_key_if_absent(&self, encoded: &str) -> NotificationResult<String> {
        let setting = app_setting::ActiveModel {
            key: Set(app_setting::EMAIL_MASTER_KEY.to_string()),
            value: Set(encoded.to_string()),
            updated_at: Set(Utc::now().fixed_offset()),
        };

        app_setting::Entity::insert(setting)
            .on_conflict(
                OnConflict::column(app_setting::Column::Key)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        // Re-read so a concurrent creator's key wins everywhere
        self.load_master_key().await?.ok_or_else(|| {
            NotificationError::Storage("master key missing right after insert".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderKind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    fn model(provider: &str, smtp_port: i32) -> provider_config::Model {
        let now = Utc::now().fixed_offset();
        provider_config::Model {
            id: Uuid::now_v7(),
            provider: provider.to_string(),
            api_key_encrypted: "sealed".to_string(),
            smtp_host: String::new(),
            smtp_port,
            smtp_username: String::new(),
            smtp_password_encrypted: String::new(),
            smtp_use_tls: true,
            mailgun_domain: String::new(),
            mailgun_region: String::new(),
            from_email: "noreply@example.com".to_string(),
            from_name: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_active_maps_row() {
        let row = model("sendgrid", 587);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()]])
            .into_connection();
        let repo = PgProviderConfigRepository::new(db);

        let config = repo.find_active().await.unwrap().unwrap();
        assert_eq!(config.id, row.id);
        assert_eq!(config.provider, "sendgrid");
        assert_eq!(config.smtp_port, 587);
    }

    #[tokio::test]
    async fn test_find_active_none_and_bad_port() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<provider_config::Model>::new(), vec![model("smtp", 70_000)]])
            .into_connection();
        let repo = PgProviderConfigRepository::new(db);

        assert!(repo.find_active().await.unwrap().is_none());
        assert!(matches!(
            repo.find_active().await,
            Err(NotificationError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_save_active_deactivates_then_inserts() {
        let inserted = model("mailgun", 587);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![inserted.clone()]])
            .into_connection();
        let repo = PgProviderConfigRepository::new(db);

        let saved = repo
            .save_active(NewProviderConfig::new(ProviderKind::Mailgun, "noreply@example.com"))
            .await
            .unwrap();
        assert_eq!(saved.id, inserted.id);
        assert!(saved.is_active);
    }

    #[tokio::test]
    async fn test_master_key_store() {
        let stored = app_setting::Model {
            key: app_setting::EMAIL_MASTER_KEY.to_string(),
            value: "existing-key".to_string(),
            updated_at: Utc::now().fixed_offset(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<app_setting::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results([vec![stored]])
            .into_connection();
        let store = PgMasterKeyStore::new(db);

        assert!(store.load_master_key().await.unwrap().is_none());
        // Insert lost the race; the existing key is returned
        let key = store.create_master_key_if_absent("candidate").await.unwrap();
        assert_eq!(key, "existing-key");
    }

    #[tokio::test]
    async fn test_query_errors_become_storage_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let store = PgMasterKeyStore::new(db);

        assert!(matches!(
            store.load_master_key().await,
            Err(NotificationError::Storage(_))
        ));
    }
}
