//! Minimal client side of an unencrypted SMTP conversation.

use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tracing::debug;

use crate::error::TransportError;

/// A complete (possibly multiline) server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Reply {
    fn is(&self, expected: &[u16]) -> bool {
        expected.contains(&self.code)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.lines.join(" / "))
    }
}

pub(crate) struct SmtpSession<S> {
    stream: BufStream<S>,
}

impl<S> SmtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an established connection and consume the server greeting.
    pub async fn open(stream: S) -> Result<Self, TransportError> {
        let mut session = Self {
            stream: BufStream::new(stream),
        };
        let greeting = session.read_reply("greeting").await?;
        if !greeting.is(&[220]) {
            return Err(rejected("greeting", &greeting));
        }
        Ok(session)
    }

    /// EHLO, falling back to HELO for servers that do not speak ESMTP.
    pub async fn hello(&mut self, client_name: &str) -> Result<(), TransportError> {
        self.write_line("EHLO", &format!("EHLO {}", client_name)).await?;
        let reply = self.read_reply("EHLO").await?;
        if reply.is(&[250]) {
            return Ok(());
        }

        debug!(reply = %reply, "EHLO refused, falling back to HELO");
        self.command("HELO", &format!("HELO {}", client_name), &[250])
            .await
            .map(|_| ())
    }

    pub async fn mail_from(&mut self, from: &str) -> Result<(), TransportError> {
        self.command("MAIL FROM", &format!("MAIL FROM:<{}>", from), &[250])
            .await
            .map(|_| ())
    }

    pub async fn rcpt_to(&mut self, to: &str) -> Result<(), TransportError> {
        self.command("RCPT TO", &format!("RCPT TO:<{}>", to), &[250, 251])
            .await
            .map(|_| ())
    }

    /// Transmit `message` (CRLF line endings) and wait for the server to queue it.
    pub async fn data(&mut self, message: &str) -> Result<(), TransportError> {
        self.command("DATA", "DATA", &[354]).await?;

        let mut payload = dot_stuff(message);
        if !payload.ends_with("\r\n") {
            payload.push_str("\r\n");
        }
        payload.push_str(".\r\n");

        self.stream
            .write_all(payload.as_bytes())
            .await
            .map_err(|e| io_error("DATA", e))?;
        self.stream.flush().await.map_err(|e| io_error("DATA", e))?;

        let reply = self.read_reply("DATA").await?;
        if !reply.is(&[250]) {
            return Err(rejected("DATA", &reply));
        }
        Ok(())
    }

    pub async fn quit(&mut self) -> Result<(), TransportError> {
        self.command("QUIT", "QUIT", &[221]).await.map(|_| ())
    }

    async fn command(
        &mut self,
        stage: &'static str,
        line: &str,
        expected: &[u16],
    ) -> Result<Reply, TransportError> {
        self.write_line(stage, line).await?;
        let reply = self.read_reply(stage).await?;
        if !reply.is(expected) {
            return Err(rejected(stage, &reply));
        }
        Ok(reply)
    }

    async fn write_line(&mut self, stage: &'static str, line: &str) -> Result<(), TransportError> {
        self.stream
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .map_err(|e| io_error(stage, e))?;
        self.stream.flush().await.map_err(|e| io_error(stage, e))
    }

    async fn read_reply(&mut self, stage: &'static str) -> Result<Reply, TransportError> {
        let mut lines = Vec::new();
        loop {
            let mut raw = String::new();
            let read = self
                .stream
                .read_line(&mut raw)
                .await
                .map_err(|e| io_error(stage, e))?;
            if read == 0 {
                return Err(TransportError::Smtp {
                    stage,
                    detail: "connection closed by server".to_string(),
                });
            }

            let line = raw.trim_end_matches(['\r', '\n']);
            let code = line
                .get(..3)
                .and_then(|c| c.parse::<u16>().ok())
                .ok_or_else(|| TransportError::Smtp {
                    stage,
                    detail: format!("malformed reply: {:?}", line),
                })?;
            let more = line.as_bytes().get(3) == Some(&b'-');
            lines.push(line.get(4..).unwrap_or_default().to_string());

            if !more {
                return Ok(Reply { code, lines });
            }
        }
    }
}

/// Escape lines starting with `.` so they are not read as end of data.
pub(crate) fn dot_stuff(message: &str) -> String {
    message
        .split("\r\n")
        .map(|line| {
            if line.starts_with('.') {
                format!(".{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn rejected(stage: &'static str, reply: &Reply) -> TransportError {
    TransportError::Smtp {
        stage,
        detail: reply.to_string(),
    }
}

fn io_error(stage: &'static str, err: std::io::Error) -> TransportError {
    TransportError::Smtp {
        stage,
        detail: err.to_string(),
    }
}
