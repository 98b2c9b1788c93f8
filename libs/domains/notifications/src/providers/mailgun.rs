//! Mailgun email provider implementation.

use super::{EmailProvider, error_body, http_client};
use crate::error::{NotificationResult, TransportError};
use crate::models::{MailgunRegion, NotificationRequest};
use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

const PROVIDER: &str = "Mailgun";

/// Mailgun API configuration.
#[derive(Clone)]
pub struct MailgunConfig {
    /// Decrypted Mailgun API key.
    pub api_key: String,
    /// Sending domain registered with Mailgun.
    pub domain: String,
    pub region: MailgunRegion,
    pub from_email: String,
    pub from_name: String,
    /// API base for `region`, without the domain.
    pub api_url: String,
}

impl MailgunConfig {
    pub fn new(
        api_key: impl Into<String>,
        domain: impl Into<String>,
        region: MailgunRegion,
        from_email: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self {
        let api_url = match region {
            MailgunRegion::Us => "https://api.mailgun.net/v3",
            MailgunRegion::Eu => "https://api.eu.mailgun.net/v3",
        };
        Self {
            api_key: api_key.into(),
            domain: domain.into(),
            region,
            from_email: from_email.into(),
            from_name: from_name.into(),
            api_url: api_url.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Full URL of the messages endpoint for the configured domain.
    pub fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_url.trim_end_matches('/'), self.domain)
    }

    fn from_header(&self) -> String {
        if self.from_name.is_empty() {
            self.from_email.clone()
        } else {
            format!("{} <{}>", self.from_name, self.from_email)
        }
    }
}

impl fmt::Debug for MailgunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailgunConfig")
            .field("domain", &self.domain)
            .field("region", &self.region)
            .field("from_email", &self.from_email)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Mailgun email provider.
#[derive(Debug)]
pub struct MailgunProvider {
    config: MailgunConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    id: Option<String>,
}

impl MailgunProvider {
    pub fn new(config: MailgunConfig, timeout: Duration) -> NotificationResult<Self> {
        Ok(Self {
            config,
            client: http_client(PROVIDER, timeout)?,
        })
    }

    pub fn config(&self) -> &MailgunConfig {
        &self.config
    }
}

#[async_trait]
impl EmailProvider for MailgunProvider {
    async fn send(&self, request: &NotificationRequest) -> NotificationResult<()> {
        let form = Form::new()
            .text("from", self.config.from_header())
            .text("to", request.to.clone())
            .text("subject", request.subject.clone())
            .text("text", request.text_body.clone())
            .text("html", request.html_body.clone());

        debug!(
            to = %request.to,
            domain = %self.config.domain,
            region = %self.config.region,
            "Sending email via Mailgun"
        );

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth("api", Some(&self.config.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        if status == StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let message_id = serde_json::from_str::<MailgunResponse>(&body)
                .ok()
                .and_then(|r| r.id);
            info!(to = %request.to, message_id = ?message_id, "Email sent successfully via Mailgun");
            return Ok(());
        }

        let body = error_body(response).await;
        error!(to = %request.to, status = %status, error = %body, "Failed to send email via Mailgun");
        Err(TransportError::Status {
            provider: PROVIDER,
            status: status.as_u16(),
            body,
        }
        .into())
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_selects_api_base() {
        let us = MailgunConfig::new("key", "mg.example.com", MailgunRegion::Us, "a@example.com", "");
        assert_eq!(
            us.messages_url(),
            "https://api.mailgun.net/v3/mg.example.com/messages"
        );

        let eu = MailgunConfig::new("key", "mg.example.com", MailgunRegion::Eu, "a@example.com", "");
        assert_eq!(
            eu.messages_url(),
            "https://api.eu.mailgun.net/v3/mg.example.com/messages"
        );
    }

    #[test]
    fn test_from_header() {
        let named = MailgunConfig::new("k", "d", MailgunRegion::Us, "noreply@example.com", "WulfVault");
        assert_eq!(named.from_header(), "WulfVault <noreply@example.com>");

        let bare = MailgunConfig::new("k", "d", MailgunRegion::Us, "noreply@example.com", "");
        assert_eq!(bare.from_header(), "noreply@example.com");
        assert!(!format!("{:?}", bare).contains("\"k\""));
    }
}
