//! Brevo (formerly Sendinblue) email provider implementation.
//!
//! A small typed client for the transactional email API: the key travels as an
//! `api-key` default header on every request.

use super::{EmailProvider, error_body};
use crate::error::{NotificationResult, TransportError};
use crate::models::NotificationRequest;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

const PROVIDER: &str = "Brevo";

/// Brevo API configuration.
#[derive(Clone)]
pub struct BrevoConfig {
    /// Decrypted Brevo API key.
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
    pub api_url: String,
}

impl BrevoConfig {
    pub fn new(
        api_key: impl Into<String>,
        from_email: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            from_email: from_email.into(),
            from_name: from_name.into(),
            api_url: "https://api.brevo.com/v3".to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

impl fmt::Debug for BrevoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrevoConfig")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Transactional email payload (`POST /smtp/email`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSmtpEmail {
    pub sender: SendSmtpEmailSender,
    pub to: Vec<SendSmtpEmailTo>,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
}

#[derive(Debug, Serialize)]
pub struct SendSmtpEmailSender {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SendSmtpEmailTo {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSmtpEmail {
    pub message_id: Option<String>,
}

/// Client for Brevo's transactional email endpoints.
#[derive(Debug, Clone)]
pub struct TransactionalEmailsApi {
    client: Client,
    base_url: String,
}

impl TransactionalEmailsApi {
    pub fn new(api_key: &str, base_url: impl Into<String>, timeout: Duration) -> NotificationResult<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).map_err(|e| TransportError::Request {
            provider: PROVIDER,
            detail: format!("API key is not a valid header value: {}", e),
        })?;
        key.set_sensitive(true);
        headers.insert("api-key", key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransportError::from_reqwest(PROVIDER, e))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Send a transactional email. Any 2xx response is success.
    pub async fn send_transac_email(&self, email: &SendSmtpEmail) -> Result<CreateSmtpEmail, TransportError> {
        let response = self
            .client
            .post(format!("{}/smtp/email", self.base_url.trim_end_matches('/')))
            .json(email)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body: error_body(response).await,
            });
        }

        // 201 carries a JSON body; other 2xx codes may not
        let body = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&body).unwrap_or(CreateSmtpEmail { message_id: None }))
    }
}

/// Brevo email provider.
#[derive(Debug)]
pub struct BrevoProvider {
    api: TransactionalEmailsApi,
    from_email: String,
    from_name: String,
}

impl BrevoProvider {
    pub fn new(config: BrevoConfig, timeout: Duration) -> NotificationResult<Self> {
        Ok(Self {
            api: TransactionalEmailsApi::new(&config.api_key, config.api_url, timeout)?,
            from_email: config.from_email,
            from_name: config.from_name,
        })
    }

    fn build_email(&self, request: &NotificationRequest) -> SendSmtpEmail {
        SendSmtpEmail {
            sender: SendSmtpEmailSender {
                email: self.from_email.clone(),
                name: self.from_name.clone(),
            },
            to: vec![SendSmtpEmailTo {
                email: request.to.clone(),
            }],
            subject: request.subject.clone(),
            html_content: request.html_body.clone(),
            text_content: request.text_body.clone(),
        }
    }
}

#[async_trait]
impl EmailProvider for BrevoProvider {
    async fn send(&self, request: &NotificationRequest) -> NotificationResult<()> {
        debug!(to = %request.to, subject = %request.subject, "Sending email via Brevo");

        match self.api.send_transac_email(&self.build_email(request)).await {
            Ok(created) => {
                info!(to = %request.to, message_id = ?created.message_id, "Email sent successfully via Brevo");
                Ok(())
            }
            Err(e) => {
                error!(to = %request.to, error = %e, "Failed to send email via Brevo");
                Err(e.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;

    #[test]
    fn test_payload_uses_camel_case_fields() {
        let provider = BrevoProvider::new(
            BrevoConfig::new("xkeysib-1", "noreply@example.com", "WulfVault"),
            Duration::from_secs(5),
        )
        .unwrap();
        let request = NotificationRequest::new("owner@example.com", "Hej", "<p>hej</p>", "hej");

        let json = serde_json::to_value(provider.build_email(&request)).unwrap();
        assert_eq!(json["sender"]["email"], "noreply@example.com");
        assert_eq!(json["sender"]["name"], "WulfVault");
        assert_eq!(json["to"].as_array().unwrap().len(), 1);
        assert_eq!(json["to"][0]["email"], "owner@example.com");
        assert_eq!(json["htmlContent"], "<p>hej</p>");
        assert_eq!(json["textContent"], "hej");
    }

    #[test]
    fn test_unusable_api_key_is_a_request_error() {
        let result = BrevoProvider::new(
            BrevoConfig::new("bad\nkey", "noreply@example.com", "WulfVault"),
            Duration::from_secs(5),
        );
        assert!(matches!(
            result,
            Err(NotificationError::Transport(TransportError::Request { .. }))
        ));
    }
}
