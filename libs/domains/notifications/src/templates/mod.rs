//! Notification content rendering.
//!
//! Handlebars-based templates for every notice kind. Rendering is pure: the
//! caller supplies every fact, including timestamps. HTML templates escape
//! interpolated values; text templates are rendered verbatim.

mod content;

use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::config::DEFAULT_PRODUCT_NAME;
use crate::error::NotificationResult;
use crate::models::{FileInfo, FileRequest};
use content::*;

/// Timestamp layout used in every notice.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rendered email content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    /// Email subject line.
    pub subject: String,
    /// HTML body content.
    pub html: String,
    /// Plain text body content.
    pub text: String,
}

/// Template engine for rendering notification bodies.
#[derive(Clone)]
pub struct TemplateEngine {
    html: Arc<Handlebars<'static>>,
    text: Arc<Handlebars<'static>>,
    product_name: String,
}

impl TemplateEngine {
    /// Create a new template engine with all templates registered.
    pub fn new() -> NotificationResult<Self> {
        Self::with_product_name(DEFAULT_PRODUCT_NAME)
    }

    /// Template engine branding footers with `product_name`.
    pub fn with_product_name(product_name: impl Into<String>) -> NotificationResult<Self> {
        let mut html = Handlebars::new();
        let mut text = Handlebars::new();
        text.register_escape_fn(handlebars::no_escape);

        for (name, html_source, text_source) in [
            ("upload", UPLOAD_HTML_TEMPLATE, UPLOAD_TEXT_TEMPLATE),
            ("download", DOWNLOAD_HTML_TEMPLATE, DOWNLOAD_TEXT_TEMPLATE),
            ("share_link", SHARE_LINK_HTML_TEMPLATE, SHARE_LINK_TEXT_TEMPLATE),
            (
                "team_invitation",
                TEAM_INVITATION_HTML_TEMPLATE,
                TEAM_INVITATION_TEXT_TEMPLATE,
            ),
            (
                "account_deletion",
                ACCOUNT_DELETION_HTML_TEMPLATE,
                ACCOUNT_DELETION_TEXT_TEMPLATE,
            ),
            ("test_message", TEST_HTML_TEMPLATE, TEST_TEXT_TEMPLATE),
        ] {
            html.register_template_string(name, html_source)?;
            text.register_template_string(name, text_source)?;
        }

        Ok(Self {
            html: Arc::new(html),
            text: Arc::new(text),
            product_name: product_name.into(),
        })
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    fn render<T: Serialize>(&self, name: &str, subject: String, data: &T) -> NotificationResult<RenderedEmail> {
        Ok(RenderedEmail {
            subject,
            html: self.html.render(name, data)?,
            text: self.text.render(name, data)?,
        })
    }

    /// Notice to a request owner that someone uploaded a file through their request.
    pub fn render_upload(
        &self,
        request: &FileRequest,
        file: &FileInfo,
        uploader_ip: &str,
        server_url: &str,
    ) -> NotificationResult<RenderedEmail> {
        debug!(file = %file.name, request = %request.title, "Rendering upload notice");

        let data = UploadNoticeData {
            request_title: &request.title,
            file_name: &file.name,
            file_size: &file.size,
            uploaded_at: format_unix_timestamp(file.upload_date),
            uploader_ip,
            dashboard_url: dashboard_url(server_url),
            product_name: &self.product_name,
        };
        self.render("upload", format!("Ny fil uppladdad: {}", request.title), &data)
    }

    /// Notice to a file owner that their file was downloaded.
    pub fn render_download(
        &self,
        file: &FileInfo,
        downloader_ip: &str,
        server_url: &str,
        downloaded_at: DateTime<Utc>,
    ) -> NotificationResult<RenderedEmail> {
        debug!(file = %file.name, "Rendering download notice");

        let data = DownloadNoticeData {
            file_name: &file.name,
            file_size: &file.size,
            downloaded_at: downloaded_at.format(TIMESTAMP_FORMAT).to_string(),
            downloader_ip,
            downloads_remaining: downloads_remaining_text(file),
            dashboard_url: dashboard_url(server_url),
            product_name: &self.product_name,
        };
        self.render("download", format!("Din fil har laddats ner: {}", file.name), &data)
    }

    /// Email carrying a share link, with an optional personal message.
    pub fn render_share_link(
        &self,
        link: &str,
        file: &FileInfo,
        message: &str,
    ) -> NotificationResult<RenderedEmail> {
        debug!(file = %file.name, has_message = !message.trim().is_empty(), "Rendering share link email");

        let data = ShareLinkData {
            link,
            file_name: &file.name,
            file_size: &file.size,
            message: optional_text(message),
            product_name: &self.product_name,
        };
        self.render("share_link", format!("Delad fil: {}", file.name), &data)
    }

    /// Email telling a user they were added to a team.
    pub fn render_team_invitation(
        &self,
        team_name: &str,
        server_url: &str,
        company_name: &str,
    ) -> NotificationResult<RenderedEmail> {
        debug!(team = %team_name, "Rendering team invitation");

        let data = TeamInvitationData {
            team_name,
            teams_url: format!("{}/teams", server_url.trim_end_matches('/')),
            company_name,
        };
        self.render(
            "team_invitation",
            format!("Du har lagts till i teamet {}", team_name),
            &data,
        )
    }

    /// Confirmation that an account and its data were deleted.
    pub fn render_account_deletion(
        &self,
        account_name: &str,
    ) -> NotificationResult<RenderedEmail> {
        let data = AccountDeletionData {
            account_name,
            product_name: &self.product_name,
        };
        self.render(
            "account_deletion",
            "Bekräftelse: Ditt konto har raderats".to_string(),
            &data,
        )
    }

    /// Message used to verify a provider configuration end to end.
    pub fn render_test_message(
        &self,
        provider: &str,
        sent_at: DateTime<Utc>,
    ) -> NotificationResult<RenderedEmail> {
        let data = TestMessageData {
            provider,
            sent_at: sent_at.format(TIMESTAMP_FORMAT).to_string(),
            product_name: &self.product_name,
        };
        self.render(
            "test_message",
            format!("{}: testmeddelande", self.product_name),
            &data,
        )
    }
}

/// Remaining-download wording for download notices.
pub fn downloads_remaining_text(file: &FileInfo) -> String {
    if file.unlimited_downloads {
        "Unlimited".to_string()
    } else if file.downloads_remaining <= 0 {
        "0 (no further downloads possible)".to_string()
    } else {
        file.downloads_remaining.to_string()
    }
}

/// Format Unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_unix_timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "okänd tidpunkt".to_string())
}

fn optional_text(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn dashboard_url(server_url: &str) -> String {
    format!("{}/dashboard", server_url.trim_end_matches('/'))
}

#[derive(Serialize)]
struct UploadNoticeData<'a> {
    request_title: &'a str,
    file_name: &'a str,
    file_size: &'a str,
    uploaded_at: String,
    uploader_ip: &'a str,
    dashboard_url: String,
    product_name: &'a str,
}

#[derive(Serialize)]
struct DownloadNoticeData<'a> {
    file_name: &'a str,
    file_size: &'a str,
    downloaded_at: String,
    downloader_ip: &'a str,
    downloads_remaining: String,
    dashboard_url: String,
    product_name: &'a str,
}

#[derive(Serialize)]
struct ShareLinkData<'a> {
    link: &'a str,
    file_name: &'a str,
    file_size: &'a str,
    message: Option<&'a str>,
    product_name: &'a str,
}

#[derive(Serialize)]
struct TeamInvitationData<'a> {
    team_name: &'a str,
    teams_url: String,
    company_name: &'a str,
}

#[derive(Serialize)]
struct AccountDeletionData<'a> {
    account_name: &'a str,
    product_name: &'a str,
}

#[derive(Serialize)]
struct TestMessageData<'a> {
    provider: &'a str,
    sent_at: String,
    product_name: &'a str,
}
