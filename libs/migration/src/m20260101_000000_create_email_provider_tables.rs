use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create the email_provider_configs table
        manager
            .create_table(
                Table::create()
                    .table(EmailProviderConfigs::Table)
                    .if_not_exists()
                    .col(pk_uuid(EmailProviderConfigs::Id))
                    .col(
                        ColumnDef::new(EmailProviderConfigs::Provider)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(text(EmailProviderConfigs::ApiKeyEncrypted).default(""))
                    .col(
                        ColumnDef::new(EmailProviderConfigs::SmtpHost)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(EmailProviderConfigs::SmtpPort)
                            .integer()
                            .not_null()
                            .default(587),
                    )
                    .col(
                        ColumnDef::new(EmailProviderConfigs::SmtpUsername)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(text(EmailProviderConfigs::SmtpPasswordEncrypted).default(""))
                    .col(
                        ColumnDef::new(EmailProviderConfigs::SmtpUseTls)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(EmailProviderConfigs::MailgunDomain)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(EmailProviderConfigs::MailgunRegion)
                            .string_len(8)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(EmailProviderConfigs::FromEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailProviderConfigs::FromName)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(EmailProviderConfigs::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        timestamp_with_time_zone(EmailProviderConfigs::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(EmailProviderConfigs::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create the app_settings key-value table
        manager
            .create_table(
                Table::create()
                    .table(AppSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppSettings::Key)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(text(AppSettings::Value))
                    .col(
                        timestamp_with_time_zone(AppSettings::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_email_provider_configs_updated_at")
                    .table(EmailProviderConfigs::Table)
                    .col(EmailProviderConfigs::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        // At most one active row
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS uq_email_provider_configs_active
                    ON email_provider_configs (is_active)
                    WHERE is_active
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uq_email_provider_configs_active")
            .await?;

        manager
            .drop_table(Table::drop().table(AppSettings::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EmailProviderConfigs::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum EmailProviderConfigs {
    Table,
    Id,
    Provider,
    ApiKeyEncrypted,
    SmtpHost,
    SmtpPort,
    SmtpUsername,
    SmtpPasswordEncrypted,
    SmtpUseTls,
    MailgunDomain,
    MailgunRegion,
    FromEmail,
    FromName,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AppSettings {
    Table,
    Key,
    Value,
    UpdatedAt,
}
