//! Subcommand implementations.

use std::sync::Arc;

use domain_notifications::models::validate_recipient;
use domain_notifications::{
    CredentialVault, NewProviderConfig, NotificationService, NotificationServiceConfig,
    PgMasterKeyStore, PgProviderConfigRepository, ProviderConfig, ProviderConfigRepository,
    ProviderKind,
};
use eyre::{Result, WrapErr, bail};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::info;

use crate::cli::{Commands, ConfigureArgs};

pub async fn run(
    command: Commands,
    db: DatabaseConnection,
    settings: NotificationServiceConfig,
) -> Result<()> {
    let configs = Arc::new(PgProviderConfigRepository::new(db.clone()));

    match command {
        Commands::Migrate => {
            info!("Running notification migrations...");
            Migrator::up(&db, None).await.wrap_err("Migration failed")?;
            info!("Migrations completed");
        }

        Commands::Configure(args) => {
            let saved = configure(args, configs.as_ref(), &vault(&db)?).await?;
            println!("{}", serde_json::to_string_pretty(&summary(&saved))?);
        }

        Commands::Show => match configs.find_active().await? {
            Some(active) => println!("{}", serde_json::to_string_pretty(&summary(&active))?),
            None => println!("No active email provider configured"),
        },

        Commands::SendTest { to } => {
            validate_recipient(&to)?;
            let service = NotificationService::new(configs, vault(&db)?, settings)?;
            service
                .send_test_email(&to)
                .await
                .wrap_err_with(|| format!("Test email to {} failed", to))?;
            println!("Test email sent to {}", to);
        }

        Commands::EncryptSecret { value } => {
            println!("{}", vault(&db)?.encrypt(&value).await?);
        }
    }

    Ok(())
}

/// Only commands that touch secrets need the master key.
fn vault(db: &DatabaseConnection) -> Result<CredentialVault> {
    let store = Arc::new(PgMasterKeyStore::new(db.clone()));
    Ok(CredentialVault::from_env(store)?)
}

/// Encrypt the secrets in `args` and store the result as the active config.
///
/// Rejects configurations that provider selection would refuse later.
pub async fn configure(
    args: ConfigureArgs,
    configs: &dyn ProviderConfigRepository,
    vault: &CredentialVault,
) -> Result<ProviderConfig> {
    validate_recipient(&args.from_email).wrap_err("Invalid sender address")?;

    let mut input = NewProviderConfig::new(args.provider, args.from_email.trim());
    input.from_name = args.from_name.trim().to_string();

    match args.provider {
        ProviderKind::Smtp => {
            if args.smtp_host.trim().is_empty() {
                bail!("--smtp-host is required for smtp");
            }
            let password = non_empty(args.smtp_password, "--smtp-password / SMTP_PASSWORD")?;
            input.smtp_host = args.smtp_host.trim().to_string();
            input.smtp_port = args.smtp_port;
            input.smtp_username = args.smtp_username.trim().to_string();
            input.smtp_password_encrypted = vault.encrypt(&password).await?;
            input.smtp_use_tls = !args.no_tls;
        }
        ProviderKind::Mailgun | ProviderKind::SendGrid | ProviderKind::Brevo => {
            let api_key = non_empty(args.api_key, "--api-key / EMAIL_API_KEY")?;
            input.api_key_encrypted = vault.encrypt(&api_key).await?;
            if args.provider == ProviderKind::Mailgun {
                if args.mailgun_domain.trim().is_empty() {
                    bail!("--mailgun-domain is required for mailgun");
                }
                input.mailgun_domain = args.mailgun_domain.trim().to_string();
                input.mailgun_region = args.mailgun_region;
            }
        }
    }

    let saved = configs.save_active(input).await?;
    info!(config_id = %saved.id, provider = %saved.provider, "Email provider configured");
    Ok(saved)
}

fn non_empty(value: Option<String>, flag: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("{} is required", flag),
    }
}

/// Printable view of a stored config. Secrets only show whether they are set.
pub fn summary(config: &ProviderConfig) -> serde_json::Value {
    let mut out = json!({
        "id": config.id,
        "provider": config.provider,
        "from_email": config.from_email,
        "from_name": config.from_name,
        "is_active": config.is_active,
        "updated_at": config.updated_at.to_rfc3339(),
    });

    let fields = match config.provider.parse::<ProviderKind>() {
        Ok(ProviderKind::Smtp) => json!({
            "smtp_host": config.smtp_host,
            "smtp_port": config.smtp_port,
            "smtp_username": config.smtp_username,
            "smtp_use_tls": config.smtp_use_tls,
            "smtp_password_set": !config.smtp_password_encrypted.is_empty(),
        }),
        Ok(ProviderKind::Mailgun) => json!({
            "mailgun_domain": config.mailgun_domain,
            "mailgun_region": config.mailgun_region,
            "api_key_set": !config.api_key_encrypted.is_empty(),
        }),
        _ => json!({ "api_key_set": !config.api_key_encrypted.is_empty() }),
    };

    if let (Some(out), Some(fields)) = (out.as_object_mut(), fields.as_object()) {
        out.extend(fields.clone());
    }
    out
}
