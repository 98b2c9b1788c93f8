//! Hand-built multipart/alternative messages for the plaintext SMTP path.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Longest UTF-8 chunk per encoded word; keeps each word under 75 characters.
const ENCODED_WORD_CHUNK: usize = 45;

/// RFC 2047 `B` encoding for header values that are not plain ASCII.
pub(crate) fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in value.chars() {
        if chunk.len() + ch.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join("\r\n ")
}

fn encoded_word(chunk: &str) -> String {
    format!("=?UTF-8?B?{}?=", BASE64.encode(chunk.as_bytes()))
}

/// `Name <address>`, or the bare address when there is no display name.
pub(crate) fn format_mailbox(name: &str, email: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return email.to_string();
    }
    if !name.is_ascii() {
        return format!("{} <{}>", encode_header_value(name), email);
    }
    if name.chars().any(|c| "()<>[]:;@\\,.\"".contains(c)) {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("\"{}\" <{}>", escaped, email);
    }
    format!("{} <{}>", name, email)
}

/// Rewrite every line ending as CRLF.
pub(crate) fn normalize_crlf(body: &str) -> String {
    let unix = body.replace("\r\n", "\n").replace('\r', "\n");
    unix.replace('\n', "\r\n")
}

pub(crate) fn new_boundary() -> String {
    format!("wulfvault-{}", Uuid::new_v4().simple())
}

/// `<uuid@domain>` using the sender's domain.
pub(crate) fn new_message_id(from_email: &str) -> String {
    let domain = from_email
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost");
    format!("<{}@{}>", Uuid::new_v4(), domain)
}

/// A two-part text/html message ready to be sent after DATA.
#[derive(Debug, Clone)]
pub(crate) struct MimeMessage<'a> {
    pub from_name: &'a str,
    pub from_email: &'a str,
    pub to: &'a str,
    pub subject: &'a str,
    pub text_body: &'a str,
    pub html_body: &'a str,
    pub date: DateTime<Utc>,
    pub message_id: String,
    pub boundary: String,
}

impl MimeMessage<'_> {
    /// Headers and body with CRLF line endings. Not yet dot-stuffed.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.text_body.len() + self.html_body.len() + 1024);
        let boundary = &self.boundary;

        out.push_str(&format!("From: {}\r\n", format_mailbox(self.from_name, self.from_email)));
        out.push_str(&format!("To: {}\r\n", self.to));
        out.push_str(&format!("Subject: {}\r\n", encode_header_value(self.subject)));
        out.push_str(&format!("Date: {}\r\n", self.date.to_rfc2822()));
        out.push_str(&format!("Message-ID: {}\r\n", self.message_id));
        out.push_str("MIME-Version: 1.0\r\n");
        out.push_str(&format!(
            "Content-Type: multipart/alternative; boundary=\"{}\"\r\n",
            boundary
        ));
        out.push_str("\r\n");

        for (content_type, body) in [("text/plain", self.text_body), ("text/html", self.html_body)] {
            out.push_str(&format!("--{}\r\n", boundary));
            out.push_str(&format!("Content-Type: {}; charset=\"UTF-8\"\r\n", content_type));
            out.push_str("Content-Transfer-Encoding: 8bit\r\n");
            out.push_str("\r\n");
            out.push_str(&normalize_crlf(body));
            out.push_str("\r\n");
        }
        out.push_str(&format!("--{}--\r\n", boundary));
        out
    }
}
