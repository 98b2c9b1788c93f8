//! Runtime settings for the notification service.

use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or_default};
use std::time::Duration;

use crate::models::MailgunRegion;

pub const DEFAULT_PRODUCT_NAME: &str = "WulfVault";
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;

/// Base URLs of the HTTP delivery APIs.
///
/// Only tests and private relays need anything but the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub sendgrid_api_url: String,
    pub mailgun_us_api_url: String,
    pub mailgun_eu_api_url: String,
    pub brevo_api_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            sendgrid_api_url: "https://api.sendgrid.com/v3".to_string(),
            mailgun_us_api_url: "https://api.mailgun.net/v3".to_string(),
            mailgun_eu_api_url: "https://api.eu.mailgun.net/v3".to_string(),
            brevo_api_url: "https://api.brevo.com/v3".to_string(),
        }
    }
}

impl ProviderEndpoints {
    /// Point every backend at one base URL.
    pub fn all(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            sendgrid_api_url: base_url.clone(),
            mailgun_us_api_url: base_url.clone(),
            mailgun_eu_api_url: base_url.clone(),
            brevo_api_url: base_url,
        }
    }

    pub fn mailgun(&self, region: MailgunRegion) -> &str {
        match region {
            MailgunRegion::Us => &self.mailgun_us_api_url,
            MailgunRegion::Eu => &self.mailgun_eu_api_url,
        }
    }
}

/// Configuration for the notification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationServiceConfig {
    /// Name used as default sender name and in email footers.
    pub product_name: String,
    /// Upper bound on a single delivery attempt.
    pub send_timeout: Duration,
    pub endpoints: ProviderEndpoints,
}

impl Default for NotificationServiceConfig {
    fn default() -> Self {
        Self {
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            endpoints: ProviderEndpoints::default(),
        }
    }
}

impl FromEnv for NotificationServiceConfig {
    /// Reads PRODUCT_NAME and NOTIFY_SEND_TIMEOUT_SECS
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 =
            env_parse_or_default("NOTIFY_SEND_TIMEOUT_SECS", DEFAULT_SEND_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::ParseError {
                key: "NOTIFY_SEND_TIMEOUT_SECS".to_string(),
                details: "timeout must be at least one second".to_string(),
            });
        }

        Ok(Self {
            product_name: env_or_default("PRODUCT_NAME", DEFAULT_PRODUCT_NAME),
            send_timeout: Duration::from_secs(timeout_secs),
            endpoints: ProviderEndpoints::default(),
        })
    }
}
