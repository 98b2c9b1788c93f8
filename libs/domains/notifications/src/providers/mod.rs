//! Email provider implementations.
//!
//! Every backend implements [`EmailProvider::send`]; the notice operations are
//! default methods so they are written once. [`Provider`] is the closed set of
//! backends the selector can produce.

mod brevo;
mod mailgun;
mod sendgrid;
pub mod smtp;

pub use brevo::{BrevoConfig, BrevoProvider};
pub use mailgun::{MailgunConfig, MailgunProvider};
pub use sendgrid::{SendGridConfig, SendGridProvider};
pub use smtp::{SmtpConfig, SmtpProvider};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;

use crate::error::{NotificationResult, TransportError};
use crate::models::{FileInfo, FileRequest, NotificationRequest, ProviderKind};
use crate::templates::{RenderedEmail, TemplateEngine};

/// Trait for email sending providers.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver a single message to a single recipient.
    async fn send(&self, request: &NotificationRequest) -> NotificationResult<()>;

    /// Get the provider name for logging.
    fn name(&self) -> &'static str;

    async fn send_rendered(&self, recipient: &str, email: RenderedEmail) -> NotificationResult<()> {
        let request = NotificationRequest::new(recipient, email.subject, email.html, email.text);
        request.validate()?;
        self.send(&request).await
    }

    async fn send_upload_notification(
        &self,
        templates: &TemplateEngine,
        request: &FileRequest,
        file: &FileInfo,
        uploader_ip: &str,
        server_url: &str,
        recipient: &str,
    ) -> NotificationResult<()> {
        let email = templates.render_upload(request, file, uploader_ip, server_url)?;
        self.send_rendered(recipient, email).await
    }

    async fn send_download_notification(
        &self,
        templates: &TemplateEngine,
        file: &FileInfo,
        downloader_ip: &str,
        server_url: &str,
        recipient: &str,
    ) -> NotificationResult<()> {
        let email = templates.render_download(file, downloader_ip, server_url, Utc::now())?;
        self.send_rendered(recipient, email).await
    }

    async fn send_share_link(
        &self,
        templates: &TemplateEngine,
        recipient: &str,
        link: &str,
        file: &FileInfo,
        message: &str,
    ) -> NotificationResult<()> {
        let email = templates.render_share_link(link, file, message)?;
        self.send_rendered(recipient, email).await
    }

    async fn send_team_invitation(
        &self,
        templates: &TemplateEngine,
        recipient: &str,
        team_name: &str,
        server_url: &str,
        company_name: &str,
    ) -> NotificationResult<()> {
        let email = templates.render_team_invitation(team_name, server_url, company_name)?;
        self.send_rendered(recipient, email).await
    }

    async fn send_account_deletion(
        &self,
        templates: &TemplateEngine,
        recipient: &str,
        account_name: &str,
    ) -> NotificationResult<()> {
        let email = templates.render_account_deletion(account_name)?;
        self.send_rendered(recipient, email).await
    }
}

/// The backend chosen by the selector for one send.
#[derive(Debug)]
pub enum Provider {
    Smtp(SmtpProvider),
    Mailgun(MailgunProvider),
    SendGrid(SendGridProvider),
    Brevo(BrevoProvider),
}

impl Provider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Smtp(_) => ProviderKind::Smtp,
            Provider::Mailgun(_) => ProviderKind::Mailgun,
            Provider::SendGrid(_) => ProviderKind::SendGrid,
            Provider::Brevo(_) => ProviderKind::Brevo,
        }
    }
}

#[async_trait]
impl EmailProvider for Provider {
    async fn send(&self, request: &NotificationRequest) -> NotificationResult<()> {
        request.validate()?;
        match self {
            Provider::Smtp(p) => p.send(request).await,
            Provider::Mailgun(p) => p.send(request).await,
            Provider::SendGrid(p) => p.send(request).await,
            Provider::Brevo(p) => p.send(request).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Provider::Smtp(p) => p.name(),
            Provider::Mailgun(p) => p.name(),
            Provider::SendGrid(p) => p.name(),
            Provider::Brevo(p) => p.name(),
        }
    }
}

impl From<SmtpProvider> for Provider {
    fn from(provider: SmtpProvider) -> Self {
        Provider::Smtp(provider)
    }
}

impl From<MailgunProvider> for Provider {
    fn from(provider: MailgunProvider) -> Self {
        Provider::Mailgun(provider)
    }
}

impl From<SendGridProvider> for Provider {
    fn from(provider: SendGridProvider) -> Self {
        Provider::SendGrid(provider)
    }
}

impl From<BrevoProvider> for Provider {
    fn from(provider: BrevoProvider) -> Self {
        Provider::Brevo(provider)
    }
}

/// HTTP client shared by the API-backed providers.
pub(crate) fn http_client(provider: &'static str, timeout: Duration) -> Result<Client, TransportError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| TransportError::from_reqwest(provider, e))
}

/// Response body for error reports, truncated so logs stay readable.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    const MAX_BODY: usize = 2048;
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_BODY {
        let mut end = MAX_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;

    fn sendgrid() -> Provider {
        SendGridProvider::new(
            SendGridConfig::new("SG.key", "noreply@example.com", "WulfVault"),
            Duration::from_secs(5),
        )
        .unwrap()
        .into()
    }

    #[test]
    fn test_provider_kind_and_name() {
        let provider = sendgrid();
        assert_eq!(provider.kind(), ProviderKind::SendGrid);
        assert_eq!(provider.name(), "SendGrid");
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected_before_sending() {
        let provider = sendgrid();
        let templates = TemplateEngine::new().unwrap();
        let file = FileInfo {
            name: "report.pdf".to_string(),
            ..Default::default()
        };

        let result = provider
            .send_share_link(&templates, "", "https://x.test/s/1", &file, "")
            .await;
        assert!(matches!(result, Err(NotificationError::Validation(_))));

        let injected = NotificationRequest::new("a@b.com\r\nBcc: c@d.com", "Hi", "<p>x</p>", "x");
        assert!(matches!(
            provider.send(&injected).await,
            Err(NotificationError::Validation(_))
        ));
    }
}
