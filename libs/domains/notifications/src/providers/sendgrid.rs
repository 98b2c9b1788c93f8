//! SendGrid email provider implementation.

use super::{EmailProvider, error_body, http_client};
use crate::error::{NotificationResult, TransportError};
use crate::models::NotificationRequest;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

const PROVIDER: &str = "SendGrid";

/// SendGrid API configuration.
#[derive(Clone)]
pub struct SendGridConfig {
    /// Decrypted SendGrid API key.
    pub api_key: String,
    /// Sender email address.
    pub from_email: String,
    /// Sender name.
    pub from_name: String,
    /// SendGrid API base URL (defaults to production).
    pub api_url: String,
}

impl SendGridConfig {
    pub fn new(
        api_key: impl Into<String>,
        from_email: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            from_email: from_email.into(),
            from_name: from_name.into(),
            api_url: "https://api.sendgrid.com/v3".to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

impl fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// SendGrid email provider.
#[derive(Debug)]
pub struct SendGridProvider {
    config: SendGridConfig,
    client: Client,
}

impl SendGridProvider {
    pub fn new(config: SendGridConfig, timeout: Duration) -> NotificationResult<Self> {
        Ok(Self {
            config,
            client: http_client(PROVIDER, timeout)?,
        })
    }

    fn build_request(&self, request: &NotificationRequest) -> SendGridRequest {
        SendGridRequest {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: request.to.clone(),
                    name: None,
                }],
            }],
            from: EmailAddress {
                email: self.config.from_email.clone(),
                name: Some(self.config.from_name.clone()),
            },
            subject: request.subject.clone(),
            content: vec![
                Content {
                    content_type: "text/plain".to_string(),
                    value: request.text_body.clone(),
                },
                Content {
                    content_type: "text/html".to_string(),
                    value: request.html_body.clone(),
                },
            ],
        }
    }
}

// SendGrid API request/response structures

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SendGridError {
    errors: Vec<SendGridErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorDetail {
    message: String,
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send(&self, request: &NotificationRequest) -> NotificationResult<()> {
        let payload = self.build_request(request);

        debug!(to = %request.to, subject = %request.subject, "Sending email via SendGrid");

        let response = self
            .client
            .post(format!("{}/mail/send", self.config.api_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            let message_id = response
                .headers()
                .get("x-message-id")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            info!(to = %request.to, message_id = ?message_id, "Email sent successfully via SendGrid");
            return Ok(());
        }

        let body = error_body(response).await;
        error!(to = %request.to, status = %status, error = %body, "Failed to send email via SendGrid");

        // Prefer the API's own error messages over the raw JSON
        let body = match serde_json::from_str::<SendGridError>(&body) {
            Ok(parsed) if !parsed.errors.is_empty() => parsed
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join(", "),
            _ => body,
        };

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

    fn provider() -> SendGridProvider {
        SendGridProvider::new(
            SendGridConfig::new("SG.test_key", "noreply@example.com", "WulfVault"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_sendgrid_config_new() {
        let config = SendGridConfig::new("SG.test_key", "test@example.com", "Test Sender");

        assert_eq!(config.api_key, "SG.test_key");
        assert_eq!(config.from_email, "test@example.com");
        assert_eq!(config.api_url, "https://api.sendgrid.com/v3");
        assert!(!format!("{:?}", config).contains("SG.test_key"));
    }

    #[test]
    fn test_request_shape() {
        let request = NotificationRequest::new("owner@example.com", "Delad fil: a.txt", "<p>hej</p>", "hej");
        let json = serde_json::to_value(provider().build_request(&request)).unwrap();

        let personalizations = json["personalizations"].as_array().unwrap();
        assert_eq!(personalizations.len(), 1);
        assert_eq!(personalizations[0]["to"].as_array().unwrap().len(), 1);
        assert_eq!(personalizations[0]["to"][0]["email"], "owner@example.com");

        assert_eq!(json["from"]["email"], "noreply@example.com");
        assert_eq!(json["from"]["name"], "WulfVault");
        assert_eq!(json["subject"], "Delad fil: a.txt");

        let content = json["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["type"], "text/plain");
        assert_eq!(content[0]["value"], "hej");
        assert_eq!(content[1]["type"], "text/html");
        assert_eq!(content[1]["value"], "<p>hej</p>");
    }
}
