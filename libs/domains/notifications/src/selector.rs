//! Builds the provider for the currently active configuration row.
//!
//! Runs on every send. Nothing is cached, so configuration changes apply to
//! the next notification.

use tracing::{debug, warn};

use crate::config::NotificationServiceConfig;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{MailgunRegion, ProviderConfig, ProviderKind};
use crate::providers::{
    BrevoConfig, BrevoProvider, MailgunConfig, MailgunProvider, Provider, SendGridConfig,
    SendGridProvider, SmtpConfig, SmtpProvider,
};
use crate::repository::ProviderConfigRepository;
use crate::vault::{CredentialVault, MasterKey, decrypt_secret};

pub const NO_ACTIVE_PROVIDER: &str = "no active email provider configured";

/// Resolve the active provider with decrypted credentials.
pub async fn select_active_provider(
    configs: &dyn ProviderConfigRepository,
    vault: &CredentialVault,
    settings: &NotificationServiceConfig,
) -> NotificationResult<Provider> {
    let row = match configs.find_active().await {
        Ok(Some(row)) => row,
        Ok(None) => return Err(NotificationError::Config(NO_ACTIVE_PROVIDER.to_string())),
        // A stored row that cannot be mapped keeps its own message
        Err(e @ NotificationError::Config(_)) => return Err(e),
        Err(e) => {
            warn!(error = %e, "Failed to load active email provider config");
            return Err(NotificationError::Config(NO_ACTIVE_PROVIDER.to_string()));
        }
    };

    let key = vault.master_key().await?;
    debug!(config_id = %row.id, provider = %row.provider, "Selected email provider config");
    build_provider(&row, &key, settings)
}

/// Construct the provider described by `row`.
pub fn build_provider(
    row: &ProviderConfig,
    key: &MasterKey,
    settings: &NotificationServiceConfig,
) -> NotificationResult<Provider> {
    let kind: ProviderKind = row
        .provider
        .trim()
        .parse()
        .map_err(|_| NotificationError::Config(format!("unknown email provider: {}", row.provider)))?;

    let from_name = if row.from_name.trim().is_empty() {
        settings.product_name.clone()
    } else {
        row.from_name.clone()
    };
    let endpoints = &settings.endpoints;
    let timeout = settings.send_timeout;

    let provider = match kind {
        ProviderKind::Brevo => {
            let api_key = required_secret(&row.api_key_encrypted, "brevo API key", key)?;
            let config = BrevoConfig::new(api_key, &row.from_email, from_name)
                .with_api_url(&endpoints.brevo_api_url);
            BrevoProvider::new(config, timeout)?.into()
        }
        ProviderKind::SendGrid => {
            let api_key = required_secret(&row.api_key_encrypted, "SendGrid API key", key)?;
            let config = SendGridConfig::new(api_key, &row.from_email, from_name)
                .with_api_url(&endpoints.sendgrid_api_url);
            SendGridProvider::new(config, timeout)?.into()
        }
        ProviderKind::Mailgun => {
            let api_key = required_secret(&row.api_key_encrypted, "Mailgun API key", key)?;
            required_field(&row.mailgun_domain, "Mailgun domain")?;
            let region = MailgunRegion::from_stored(&row.mailgun_region)?;
            let config = MailgunConfig::new(
                api_key,
                row.mailgun_domain.trim(),
                region,
                &row.from_email,
                from_name,
            )
            .with_api_url(endpoints.mailgun(region));
            MailgunProvider::new(config, timeout)?.into()
        }
        ProviderKind::Smtp => {
            required_field(&row.smtp_host, "SMTP host")?;
            let password = required_secret(&row.smtp_password_encrypted, "SMTP password", key)?;
            let config = SmtpConfig::new(row.smtp_host.trim(), row.smtp_port, &row.from_email, from_name)
                .with_tls(row.smtp_use_tls)
                .with_credentials(&row.smtp_username, password);
            SmtpProvider::new(config, timeout).into()
        }
    };

    Ok(provider)
}

fn required_field(value: &str, field: &str) -> NotificationResult<()> {
    if value.trim().is_empty() {
        return Err(NotificationError::Config(format!("{} not configured", field)));
    }
    Ok(())
}

fn required_secret(encrypted: &str, field: &str, key: &MasterKey) -> NotificationResult<String> {
    required_field(encrypted, field)?;
    decrypt_secret(encrypted, key)
}
