use crate::error::NotificationError;
use crate::models::{NewProviderConfig, ProviderConfig};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

/// Sea-ORM Entity for the email_provider_configs table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "email_provider_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub provider: String,
    #[sea_orm(column_type = "Text")]
    pub api_key_encrypted: String,
    pub smtp_host: String,
    pub smtp_port: i32,
    pub smtp_username: String,
    #[sea_orm(column_type = "Text")]
    pub smtp_password_encrypted: String,
    pub smtp_use_tls: bool,
    pub mailgun_domain: String,
    pub mailgun_region: String,
    pub from_email: String,
    pub from_name: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// Conversion from Sea-ORM Model to domain ProviderConfig
impl TryFrom<Model> for ProviderConfig {
    type Error = NotificationError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let smtp_port = u16::try_from(model.smtp_port).map_err(|_| {
            NotificationError::Config(format!("invalid SMTP port in stored config: {}", model.smtp_port))
        })?;

        Ok(Self {
            id: model.id,
            provider: model.provider,
            api_key_encrypted: model.api_key_encrypted,
            smtp_host: model.smtp_host,
            smtp_port,
            smtp_username: model.smtp_username,
            smtp_password_encrypted: model.smtp_password_encrypted,
            smtp_use_tls: model.smtp_use_tls,
            mailgun_domain: model.mailgun_domain,
            mailgun_region: model.mailgun_region,
            from_email: model.from_email,
            from_name: model.from_name,
            is_active: model.is_active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

// Conversion from domain NewProviderConfig to an active row
impl From<NewProviderConfig> for ActiveModel {
    fn from(input: NewProviderConfig) -> Self {
        let config = ProviderConfig::from_new(input);
        ActiveModel {
            id: Set(config.id),
            provider: Set(config.provider),
            api_key_encrypted: Set(config.api_key_encrypted),
            smtp_host: Set(config.smtp_host),
            smtp_port: Set(i32::from(config.smtp_port)),
            smtp_username: Set(config.smtp_username),
            smtp_password_encrypted: Set(config.smtp_password_encrypted),
            smtp_use_tls: Set(config.smtp_use_tls),
            mailgun_domain: Set(config.mailgun_domain),
            mailgun_region: Set(config.mailgun_region),
            from_email: Set(config.from_email),
            from_name: Set(config.from_name),
            is_active: Set(true),
            created_at: Set(config.created_at.into()),
            updated_at: Set(config.updated_at.into()),
        }
    }
}
