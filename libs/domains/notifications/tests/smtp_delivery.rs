//! End-to-end delivery over the plaintext SMTP path against a local relay.

mod common;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use common::{file, service_with, start_fake_smtp, start_smtp_without_starttls};
use domain_notifications::{
    MasterKey, NewProviderConfig, NotificationError, ProviderKind, TransportError, encrypt_secret,
};

fn plain_smtp(port: u16, key: &MasterKey) -> NewProviderConfig {
    let mut input = NewProviderConfig::new(ProviderKind::Smtp, "noreply@vault.example.com");
    input.smtp_host = "127.0.0.1".to_string();
    input.smtp_port = port;
    input.smtp_use_tls = false;
    input.smtp_password_encrypted = encrypt_secret("relay-password", key).unwrap();
    input
}

#[tokio::test]
async fn test_download_notification_over_plain_smtp() {
    let key = MasterKey::generate();
    let (port, relay) = start_fake_smtp().await;
    let service = service_with(plain_smtp(port, &key), key, "http://unused.invalid").await;

    service
        .notify_download(&file("report.pdf", 1), "203.0.113.9", "https://vault.example.com/", "owner@example.com")
        .await;

    let transcript = relay.await.unwrap();
    assert_eq!(transcript.commands[0], "EHLO vault.example.com");
    assert!(transcript.commands.contains(&"MAIL FROM:<noreply@vault.example.com>".to_string()));
    assert!(transcript.commands.contains(&"RCPT TO:<owner@example.com>".to_string()));
    assert_eq!(transcript.commands.last().map(String::as_str), Some("QUIT"));
    // Credentials never leave the process without TLS
    assert!(!transcript.commands.iter().any(|c| c.starts_with("AUTH")));

    let data = &transcript.data;
    assert!(data.contains("Subject: Din fil har laddats ner: report.pdf\r\n"));
    assert!(data.contains("From: WulfVault <noreply@vault.example.com>\r\n"));
    assert!(data.contains("Content-Type: multipart/alternative"));
    assert!(data.contains("text/plain"));
    assert!(data.contains("text/html"));
    assert!(data.contains("Nedladdningar kvar: 1"));
    assert!(data.contains("203.0.113.9"));
    assert!(data.contains("https://vault.example.com/dashboard"));
}

#[tokio::test]
async fn test_non_ascii_subject_is_encoded() {
    let key = MasterKey::generate();
    let (port, relay) = start_fake_smtp().await;
    let service = service_with(plain_smtp(port, &key), key, "http://unused.invalid").await;

    service
        .notify_account_deletion("gone@example.com", "Åsa Öberg")
        .await
        .unwrap();

    let transcript = relay.await.unwrap();
    let expected = format!(
        "Subject: =?UTF-8?B?{}?=\r\n",
        BASE64.encode("Bekräftelse: Ditt konto har raderats")
    );
    assert!(transcript.data.contains(&expected));
    assert!(transcript.data.contains("Åsa Öberg"));
}

#[tokio::test]
async fn test_share_link_carries_personal_message() {
    let key = MasterKey::generate();
    let (port, relay) = start_fake_smtp().await;
    let service = service_with(plain_smtp(port, &key), key, "http://unused.invalid").await;

    service
        .notify_share_link(
            "friend@example.com",
            "https://vault.example.com/s/abc123",
            &file("budget.xlsx", 0),
            "Hej! Här är budgeten.",
        )
        .await
        .unwrap();

    let transcript = relay.await.unwrap();
    assert!(transcript.data.contains("Subject: Delad fil: budget.xlsx\r\n"));
    assert!(transcript.data.contains("https://vault.example.com/s/abc123"));
    assert!(transcript.data.contains("Meddelande:"));
    assert!(transcript.data.contains("Hej! Här är budgeten."));
}

#[tokio::test]
async fn test_team_invitation_uses_company_name() {
    let key = MasterKey::generate();
    let (port, relay) = start_fake_smtp().await;
    let service = service_with(plain_smtp(port, &key), key, "http://unused.invalid").await;

    service
        .notify_team_invitation("member@example.com", "Ekonomi", "https://vault.example.com", "Acme AB")
        .await
        .unwrap();

    let transcript = relay.await.unwrap();
    assert!(transcript.data.contains("Subject: Du har lagts till i teamet Ekonomi\r\n"));
    assert!(transcript.data.contains("https://vault.example.com/teams"));
    assert!(transcript.data.contains("Acme AB"));
}

#[tokio::test]
async fn test_tls_config_refuses_relay_without_starttls() {
    let key = MasterKey::generate();
    let (port, relay) = start_smtp_without_starttls().await;

    let mut input = plain_smtp(port, &key);
    input.smtp_use_tls = true;
    input.smtp_username = "mailer".to_string();
    let service = service_with(input, key, "http://unused.invalid").await;

    let result = service.send_test_email("admin@example.com").await;
    assert!(
        matches!(result, Err(NotificationError::Transport(TransportError::Smtp { .. }))),
        "got {result:?}"
    );

    // Neither credentials nor the envelope go out over the unencrypted channel
    let commands = relay.await.unwrap();
    assert!(commands.first().is_some_and(|c| c.starts_with("EHLO")));
    assert!(!commands.iter().any(|c| c.starts_with("AUTH")));
    assert!(!commands.iter().any(|c| c.starts_with("MAIL FROM")));
}
