//! Notification service: the entry point used by the file-transfer handlers.
//!
//! Upload and download notices are best effort: every failure is logged and
//! swallowed so the primary operation never fails because of email. All other
//! operations return the error to the caller.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::NotificationServiceConfig;
use crate::error::{NotificationResult, TransportError};
use crate::models::{FileInfo, FileRequest, validate_recipient};
use crate::providers::{EmailProvider, Provider};
use crate::repository::ProviderConfigRepository;
use crate::selector::select_active_provider;
use crate::templates::TemplateEngine;
use crate::vault::CredentialVault;

/// Service for sending notifications through the active provider.
pub struct NotificationService {
    configs: Arc<dyn ProviderConfigRepository>,
    vault: CredentialVault,
    templates: Arc<TemplateEngine>,
    config: NotificationServiceConfig,
}

impl NotificationService {
    pub fn new(
        configs: Arc<dyn ProviderConfigRepository>,
        vault: CredentialVault,
        config: NotificationServiceConfig,
    ) -> NotificationResult<Self> {
        let templates = TemplateEngine::with_product_name(config.product_name.clone())?;
        Ok(Self {
            configs,
            vault,
            templates: Arc::new(templates),
            config,
        })
    }

    pub fn config(&self) -> &NotificationServiceConfig {
        &self.config
    }

    /// Select the provider for this send. Never cached.
    pub async fn active_provider(&self) -> NotificationResult<Provider> {
        select_active_provider(self.configs.as_ref(), &self.vault, &self.config).await
    }

    /// Run `send` with the active provider under the send timeout.
    async fn deliver<'a, F, Fut>(&'a self, send: F) -> NotificationResult<()>
    where
        F: FnOnce(Provider, &'a TemplateEngine) -> Fut,
        Fut: Future<Output = NotificationResult<()>>,
    {
        let timeout = self.config.send_timeout;
        let attempt = async move {
            let provider = self.active_provider().await?;
            debug!(provider = provider.name(), "Delivering notification");
            send(provider, &*self.templates).await
        };

        match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                timeout_secs: timeout.as_secs(),
            }
            .into()),
        }
    }

    /// Tell a request owner that a file arrived through their upload request.
    ///
    /// Never fails; problems are logged at `warn`.
    pub async fn notify_upload(
        &self,
        request: &FileRequest,
        file: &FileInfo,
        uploader_ip: &str,
        server_url: &str,
        recipient: &str,
    ) {
        let result = match validate_recipient(recipient) {
            Ok(()) => {
                self.deliver(|provider, templates| async move {
                    provider
                        .send_upload_notification(templates, request, file, uploader_ip, server_url, recipient)
                        .await
                })
                .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!(request = %request.id, file = %file.id, "Upload notification sent"),
            Err(e) => warn!(
                request = %request.id,
                file = %file.id,
                kind = e.kind(),
                error = %e,
                "Upload notification not sent"
            ),
        }
    }

    /// Tell a file owner that their file was downloaded.
    ///
    /// Never fails; problems are logged at `warn`.
    pub async fn notify_download(
        &self,
        file: &FileInfo,
        downloader_ip: &str,
        server_url: &str,
        recipient: &str,
    ) {
        let result = match validate_recipient(recipient) {
            Ok(()) => {
                self.deliver(|provider, templates| async move {
                    provider
                        .send_download_notification(templates, file, downloader_ip, server_url, recipient)
                        .await
                })
                .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!(file = %file.id, "Download notification sent"),
            Err(e) => warn!(
                file = %file.id,
                kind = e.kind(),
                error = %e,
                "Download notification not sent"
            ),
        }
    }

    /// Email a share link, optionally with a personal message.
    pub async fn notify_share_link(
        &self,
        recipient: &str,
        link: &str,
        file: &FileInfo,
        message: &str,
    ) -> NotificationResult<()> {
        validate_recipient(recipient)?;
        self.deliver(|provider, templates| async move {
            provider
                .send_share_link(templates, recipient, link, file, message)
                .await
        })
        .await
    }

    /// Tell a user they were added to a team. The caller decides whether a
    /// failure matters.
    pub async fn notify_team_invitation(
        &self,
        recipient: &str,
        team_name: &str,
        server_url: &str,
        company_name: &str,
    ) -> NotificationResult<()> {
        validate_recipient(recipient)?;
        self.deliver(|provider, templates| async move {
            provider
                .send_team_invitation(templates, recipient, team_name, server_url, company_name)
                .await
        })
        .await
    }

    /// Confirm that an account and all its files were deleted.
    pub async fn notify_account_deletion(&self, recipient: &str, account_name: &str) -> NotificationResult<()> {
        validate_recipient(recipient)?;
        self.deliver(|provider, templates| async move {
            provider
                .send_account_deletion(templates, recipient, account_name)
                .await
        })
        .await
    }

    /// Send a diagnostic message through the active provider.
    pub async fn send_test_email(&self, recipient: &str) -> NotificationResult<()> {
        validate_recipient(recipient)?;
        self.deliver(|provider, templates| async move {
            let email = templates.render_test_message(provider.kind().as_ref(), Utc::now())?;
            provider.send_rendered(recipient, email).await
        })
        .await
    }
}
