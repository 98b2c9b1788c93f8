//! Notifications Domain
//!
//! Email notification delivery for WulfVault file transfers.
//!
//! # Features
//!
//! - Upload and download notices to file owners (best effort, never fail the caller)
//! - Share-link, team-invitation and account-deletion emails
//! - Runtime-selectable provider: SMTP, Mailgun, SendGrid or Brevo
//! - Provider secrets encrypted at rest with AES-256-GCM
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  File handlers  │  ← upload / download / share / team / account
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ NotificationSvc │  ← failure policy, send timeout
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │    Selector     │  ← active config row + credential vault
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Email Provider  │  ← SMTP, Mailgun, SendGrid, Brevo
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{
//!     CredentialVault, NotificationService, NotificationServiceConfig,
//!     PgMasterKeyStore, PgProviderConfigRepository,
//! };
//!
//! let configs = Arc::new(PgProviderConfigRepository::new(db.clone()));
//! let vault = CredentialVault::from_env(Arc::new(PgMasterKeyStore::new(db)))?;
//! let service = NotificationService::new(configs, vault, NotificationServiceConfig::default())?;
//!
//! // Never fails; problems are logged
//! service.notify_download(&file, &client_ip, &server_url, &owner_email).await;
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod providers;
pub mod repository;
pub mod selector;
pub mod service;
pub mod templates;
pub mod vault;

// Re-export commonly used types
pub use config::{NotificationServiceConfig, ProviderEndpoints};
pub use error::{NotificationError, NotificationResult, TransportError};
pub use models::{
    FileInfo, FileRequest, MailgunRegion, NewProviderConfig, NotificationRequest, ProviderConfig,
    ProviderKind,
};
pub use postgres::{PgMasterKeyStore, PgProviderConfigRepository};
pub use providers::{EmailProvider, Provider};
pub use repository::{
    InMemoryMasterKeyStore, InMemoryProviderConfigRepository, MasterKeyStore,
    ProviderConfigRepository,
};
pub use selector::select_active_provider;
pub use service::NotificationService;
pub use templates::{RenderedEmail, TemplateEngine};
pub use vault::{CredentialVault, MasterKey, decrypt_secret, encrypt_secret, get_or_create_master_key};
