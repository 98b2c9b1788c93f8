//! SMTP email provider.
//!
//! With TLS enabled, delivery goes through lettre: implicit TLS on port 465 and
//! mandatory STARTTLS on any other port, certificates always verified. Without
//! TLS a plain SMTP conversation is driven directly, for relays such as
//! MailHog on a trusted network. No authentication is attempted in plaintext.

mod mime;
mod session;

use super::EmailProvider;
use crate::error::{NotificationResult, TransportError};
use crate::models::NotificationRequest;
use async_trait::async_trait;
use chrono::Utc;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use mime::{MimeMessage, new_boundary, new_message_id};
use session::SmtpSession;

const PROVIDER: &str = "SMTP";
const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP provider configuration.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Decrypted SMTP password.
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub use_tls: bool,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>, port: u16, from_email: impl Into<String>, from_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
            from_email: from_email.into(),
            from_name: from_name.into(),
            use_tls: true,
        }
    }

    /// Builder method to set TLS.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Builder method to set credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("use_tls", &self.use_tls)
            .finish_non_exhaustive()
    }
}

/// SMTP email provider. Opens a fresh connection for every message.
#[derive(Debug)]
pub struct SmtpProvider {
    config: SmtpConfig,
    timeout: Duration,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, TransportError> {
        let config = &self.config;
        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| TransportError::Request {
            provider: PROVIDER,
            detail: format!("failed to create SMTP relay: {}", e),
        })?;

        let mut builder = builder.port(config.port).timeout(Some(self.timeout));
        if config.has_credentials() {
            builder = builder.credentials(Credentials::new(config.username.clone(), config.password.clone()));
        }
        Ok(builder.build())
    }

    fn build_message(&self, request: &NotificationRequest) -> Result<Message, TransportError> {
        let invalid = |what: &str, e: &dyn fmt::Display| TransportError::Request {
            provider: PROVIDER,
            detail: format!("invalid {}: {}", what, e),
        };

        let from = Mailbox::new(
            Some(self.config.from_name.clone()).filter(|name| !name.is_empty()),
            self.config
                .from_email
                .parse()
                .map_err(|e| invalid("from address", &e))?,
        );
        let to = Mailbox::new(None, request.to.parse().map_err(|e| invalid("to address", &e))?);

        Message::builder()
            .from(from)
            .to(to)
            .subject(&request.subject)
            .multipart(MultiPart::alternative_plain_html(
                request.text_body.clone(),
                request.html_body.clone(),
            ))
            .map_err(|e| invalid("message", &e))
    }

    async fn send_tls(&self, request: &NotificationRequest) -> NotificationResult<()> {
        let message = self.build_message(request)?;
        let transport = self.build_transport()?;

        transport.send(message).await.map_err(|e| {
            error!(host = %self.config.host, port = self.config.port, error = %e, "SMTP delivery failed");
            TransportError::Smtp {
                stage: "send",
                detail: e.to_string(),
            }
        })?;
        Ok(())
    }

    async fn send_plain(&self, request: &NotificationRequest) -> NotificationResult<()> {
        warn!(
            host = %self.config.host,
            port = self.config.port,
            "Using plain SMTP without TLS, connection is not encrypted"
        );
        if self.config.has_credentials() {
            warn!("SMTP credentials are configured but are never sent without TLS");
        }

        let message = MimeMessage {
            from_name: &self.config.from_name,
            from_email: &self.config.from_email,
            to: &request.to,
            subject: &request.subject,
            text_body: &request.text_body,
            html_body: &request.html_body,
            date: Utc::now(),
            message_id: new_message_id(&self.config.from_email),
            boundary: new_boundary(),
        }
        .render();

        let conversation = async {
            let stream = TcpStream::connect((self.config.host.as_str(), self.config.port))
                .await
                .map_err(|e| TransportError::Smtp {
                    stage: "connect",
                    detail: e.to_string(),
                })?;

            let mut session = SmtpSession::open(stream).await?;
            session.hello(&client_name(&self.config.from_email)).await?;
            session.mail_from(&self.config.from_email).await?;
            session.rcpt_to(&request.to).await?;
            session.data(&message).await?;
            session.quit().await?;
            Ok::<_, TransportError>(())
        };

        match tokio::time::timeout(self.timeout, conversation).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(host = %self.config.host, port = self.config.port, error = %e, "Plain SMTP delivery failed");
                Err(e.into())
            }
            Err(_) => Err(TransportError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
            .into()),
        }
    }
}

/// Name announced in EHLO: the sender's domain, or `localhost`.
fn client_name(from_email: &str) -> String {
    from_email
        .rsplit_once('@')
        .map(|(_, domain)| domain.to_string())
        .filter(|domain| !domain.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, request: &NotificationRequest) -> NotificationResult<()> {
        debug!(
            to = %request.to,
            host = %self.config.host,
            port = self.config.port,
            tls = self.config.use_tls,
            "Sending email via SMTP"
        );

        if self.config.use_tls {
            self.send_tls(request).await?;
        } else {
            self.send_plain(request).await?;
        }

        info!(to = %request.to, "Email sent successfully via SMTP");
        Ok(())
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
