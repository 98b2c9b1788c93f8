//! Data models for the notifications domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::error::{NotificationError, NotificationResult};

// ============================================================================
// Provider configuration
// ============================================================================

/// Delivery backends that can be configured as the active provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Brevo,
    Mailgun,
    SendGrid,
    Smtp,
}

/// Mailgun API region. Accounts live in exactly one of them.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MailgunRegion {
    #[default]
    Us,
    Eu,
}

impl MailgunRegion {
    /// Parse a stored region value; blank means the default region.
    pub fn from_stored(value: &str) -> NotificationResult<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(MailgunRegion::Us);
        }
        value
            .parse()
            .map_err(|_| NotificationError::Config(format!("unknown Mailgun region: {}", value)))
    }
}

/// The persisted provider configuration row.
///
/// `provider` stays a raw string so that an unrecognized value can be
/// reported by the selector instead of failing the row mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: Uuid,
    pub provider: String,
    /// Encrypted API key (Brevo, Mailgun, SendGrid).
    pub api_key_encrypted: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    /// Encrypted SMTP password.
    pub smtp_password_encrypted: String,
    pub smtp_use_tls: bool,
    pub mailgun_domain: String,
    pub mailgun_region: String,
    pub from_email: String,
    pub from_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for storing a new active provider configuration.
///
/// Secret fields must already be encrypted with the master key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProviderConfig {
    pub provider: ProviderKind,
    pub api_key_encrypted: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password_encrypted: String,
    pub smtp_use_tls: bool,
    pub mailgun_domain: String,
    pub mailgun_region: MailgunRegion,
    pub from_email: String,
    pub from_name: String,
}

impl NewProviderConfig {
    pub fn new(provider: ProviderKind, from_email: impl Into<String>) -> Self {
        Self {
            provider,
            api_key_encrypted: String::new(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password_encrypted: String::new(),
            smtp_use_tls: true,
            mailgun_domain: String::new(),
            mailgun_region: MailgunRegion::default(),
            from_email: from_email.into(),
            from_name: String::new(),
        }
    }
}

impl ProviderConfig {
    /// Materialize a stored row from creation input.
    pub fn from_new(input: NewProviderConfig) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            provider: input.provider.to_string(),
            api_key_encrypted: input.api_key_encrypted,
            smtp_host: input.smtp_host,
            smtp_port: input.smtp_port,
            smtp_username: input.smtp_username,
            smtp_password_encrypted: input.smtp_password_encrypted,
            smtp_use_tls: input.smtp_use_tls,
            mailgun_domain: input.mailgun_domain,
            mailgun_region: input.mailgun_region.to_string(),
            from_email: input.from_email,
            from_name: input.from_name,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Outbound message
// ============================================================================

/// A rendered notification ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl NotificationRequest {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
        text_body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html_body: html_body.into(),
            text_body: text_body.into(),
        }
    }

    /// Reject input that would produce a malformed or injected message.
    pub fn validate(&self) -> NotificationResult<()> {
        validate_recipient(&self.to)?;
        if self.subject.contains(['\r', '\n']) {
            return Err(NotificationError::Validation(
                "subject must not contain line breaks".to_string(),
            ));
        }
        Ok(())
    }
}

/// Check that a recipient looks like a single mailbox address.
pub fn validate_recipient(recipient: &str) -> NotificationResult<()> {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(NotificationError::Validation(
            "recipient address is missing".to_string(),
        ));
    }
    if recipient.contains(['\r', '\n', '<', '>', ',', ' ']) {
        return Err(NotificationError::Validation(format!(
            "recipient address contains illegal characters: {:?}",
            recipient
        )));
    }
    match recipient.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(NotificationError::Validation(format!(
            "invalid recipient address: {}",
            recipient
        ))),
    }
}

// ============================================================================
// Domain facts supplied by the file-storage collaborators
// ============================================================================

/// File metadata as tracked by the storage layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    pub name: String,
    /// Human-readable size, already formatted by the storage layer (e.g. "2 MB").
    pub size: String,
    pub downloads_remaining: i64,
    pub unlimited_downloads: bool,
    /// Upload time as Unix seconds.
    pub upload_date: i64,
}

/// An upload request a file was submitted through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRequest {
    pub id: String,
    pub title: String,
}
