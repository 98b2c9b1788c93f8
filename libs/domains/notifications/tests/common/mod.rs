//! Shared fixtures: in-process stand-ins for the vendor APIs and an SMTP relay.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use domain_notifications::{
    CredentialVault, FileInfo, InMemoryMasterKeyStore, InMemoryProviderConfigRepository, MasterKey,
    NewProviderConfig, NotificationService, NotificationServiceConfig, ProviderEndpoints,
    ProviderConfigRepository,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Clone)]
struct FakeState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    status: StatusCode,
    body: &'static str,
}

/// HTTP server that records every request and answers with a fixed response.
pub struct FakeHttpServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    _handle: JoinHandle<()>,
}

impl FakeHttpServer {
    pub async fn start(status: StatusCode, body: &'static str) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState {
            requests: requests.clone(),
            status,
            body,
        };
        let app = Router::new().fallback(record).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
            _handle: handle,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<FakeState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    });
    (state.status, state.body)
}

/// What a fake SMTP relay saw during one session.
#[derive(Debug, Default)]
pub struct SmtpTranscript {
    pub commands: Vec<String>,
    pub data: String,
}

/// Accepts one SMTP session, accepts the message and records it.
pub async fn start_fake_smtp() -> (u16, JoinHandle<SmtpTranscript>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut transcript = SmtpTranscript::default();

        write.write_all(b"220 fake.smtp.test ESMTP\r\n").await.unwrap();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let command = line.trim_end().to_string();
            let verb = command.split([' ', ':']).next().unwrap_or_default().to_ascii_uppercase();
            transcript.commands.push(command);

            match verb.as_str() {
                "EHLO" => write.write_all(b"250-fake.smtp.test\r\n250 8BITMIME\r\n").await.unwrap(),
                "DATA" => {
                    write.write_all(b"354 end data with <CR><LF>.<CR><LF>\r\n").await.unwrap();
                    loop {
                        let mut next = String::new();
                        if reader.read_line(&mut next).await.unwrap() == 0 || next == ".\r\n" {
                            break;
                        }
                        transcript.data.push_str(&next);
                    }
                    write.write_all(b"250 queued\r\n").await.unwrap();
                }
                "QUIT" => {
                    write.write_all(b"221 bye\r\n").await.unwrap();
                    break;
                }
                _ => write.write_all(b"250 ok\r\n").await.unwrap(),
            }
        }
        transcript
    });

    (port, handle)
}

pub fn file(name: &str, downloads_remaining: i64) -> FileInfo {
    FileInfo {
        id: "file-1".to_string(),
        name: name.to_string(),
        size: "2 MB".to_string(),
        downloads_remaining,
        unlimited_downloads: false,
        upload_date: 1_700_000_000,
    }
}

/// A service whose only stored config is `input`, with every HTTP backend at `base_url`.
pub async fn service_with(input: NewProviderConfig, key: MasterKey, base_url: &str) -> NotificationService {
    let repo = InMemoryProviderConfigRepository::new();
    repo.save_active(input).await.unwrap();

    let vault = CredentialVault::with_key(Arc::new(InMemoryMasterKeyStore::new()), key);
    let config = NotificationServiceConfig {
        send_timeout: Duration::from_secs(5),
        endpoints: ProviderEndpoints::all(base_url),
        ..Default::default()
    };
    NotificationService::new(Arc::new(repo), vault, config).unwrap()
}

/// Relay that offers AUTH but never STARTTLS. Records every command line.
pub async fn start_smtp_without_starttls() -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut commands = Vec::new();

        write.write_all(b"220 plain.smtp.test ESMTP\r\n").await.unwrap();
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let command = line.trim_end().to_string();
            let verb = command.split(' ').next().unwrap_or_default().to_ascii_uppercase();
            commands.push(command);

            let reply: &[u8] = match verb.as_str() {
                "EHLO" => b"250-plain.smtp.test\r\n250 AUTH PLAIN LOGIN\r\n",
                "QUIT" => b"221 bye\r\n",
                _ => b"250 ok\r\n",
            };
            if write.write_all(reply).await.is_err() || verb == "QUIT" {
                break;
            }
        }
        commands
    });

    (port, handle)
}
