//! Error types for the notifications domain.

use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur while selecting a provider or delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No usable active provider configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored secret could not be decrypted with the current master key.
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// The backend could not be reached or rejected the message.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Caller input is unusable; nothing was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Reading or writing the configuration store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Template rendering error.
    #[error("Template rendering error: {0}")]
    Template(String),
}

/// Failures talking to a delivery backend.
///
/// `Request` covers messages that could not even be built; every other variant
/// is a failed exchange. Callers treat both the same way.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{provider}: failed to build request: {detail}")]
    Request {
        provider: &'static str,
        detail: String,
    },

    #[error("{provider}: request failed: {detail}")]
    Connection {
        provider: &'static str,
        detail: String,
    },

    #[error("{provider} API error ({status}): {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("SMTP {stage} failed: {detail}")]
    Smtp { stage: &'static str, detail: String },

    #[error("send timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl TransportError {
    /// Classify a reqwest failure for the given backend.
    pub(crate) fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::Request {
                provider,
                detail: err.to_string(),
            }
        } else {
            TransportError::Connection {
                provider,
                detail: err.to_string(),
            }
        }
    }
}

impl NotificationError {
    /// Short machine-friendly label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationError::Config(_) => "config",
            NotificationError::Decryption(_) => "decryption",
            NotificationError::Transport(_) => "transport",
            NotificationError::Validation(_) => "validation",
            NotificationError::Storage(_) => "storage",
            NotificationError::Template(_) => "template",
        }
    }
}

impl From<sea_orm::DbErr> for NotificationError {
    fn from(err: sea_orm::DbErr) -> Self {
        NotificationError::Storage(err.to_string())
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for NotificationError {
    fn from(err: handlebars::TemplateError) -> Self {
        NotificationError::Template(err.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::Template(format!("JSON serialization error: {}", err))
    }
}
