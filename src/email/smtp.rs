//! Minimal SMTP client for transactional mail.
//!
//! Supports implicit TLS on port 465 and STARTTLS on 587, with
//! AUTH LOGIN. Every server reply is checked against the expected
//! code; anything off-script aborts the session and reports failure.

use std::io;
use std::sync::Arc;

use base64::Engine;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::config::SmtpConfig;

const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// A prepared RFC 5322 message: envelope recipient plus headers and body.
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    /// Extra headers (From, MIME-Version, Content-Type, ...), no trailing CRLF
    pub headers: Vec<String>,
    pub body: String,
}

struct SmtpSession<S> {
    stream: BufReader<S>,
    read_buf: Vec<u8>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> SmtpSession<S> {
    fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            read_buf: Vec::with_capacity(512),
        }
    }

    fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    async fn read_line(&mut self) -> io::Result<String> {
        self.read_buf.clear();
        loop {
            let byte = self.stream.read_u8().await?;
            if byte == b'\n' {
                break;
            }
            if byte != b'\r' {
                self.read_buf.push(byte);
            }
            if self.read_buf.len() > 2048 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "SMTP reply line too long",
                ));
            }
        }
        Ok(String::from_utf8_lossy(&self.read_buf).into_owned())
    }

    /// Read a full (possibly multiline) reply; the last line has a space
    /// after the code instead of a hyphen. Returns all lines joined.
    async fn read_reply(&mut self) -> io::Result<String> {
        let mut reply = String::new();
        loop {
            let line = self.read_line().await?;
            let done = line.as_bytes().get(3) != Some(&b'-');
            if !reply.is_empty() {
                reply.push('\n');
            }
            reply.push_str(&line);
            if done {
                return Ok(reply);
            }
        }
    }

    /// Read a reply and require the given code on its final line.
    async fn expect(&mut self, code: &str) -> io::Result<String> {
        let reply = self.read_reply().await?;
        let last = reply.rsplit('\n').next().unwrap_or(&reply);
        if !last.starts_with(code) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected {}, got: {}", code, last),
            ));
        }
        Ok(reply)
    }

    async fn command(&mut self, line: &str) -> io::Result<()> {
        self.stream.get_mut().write_all(line.as_bytes()).await?;
        self.stream.get_mut().write_all(b"\r\n").await?;
        self.stream.get_mut().flush().await
    }

    /// AUTH LOGIN through message submission. Same script regardless of
    /// how the transport was established.
    async fn authenticate_and_send(
        &mut self,
        config: &SmtpConfig,
        message: &OutgoingMessage,
    ) -> io::Result<()> {
        let b64 = base64::engine::general_purpose::STANDARD;

        self.command("AUTH LOGIN").await?;
        self.expect("334").await?;
        self.command(&b64.encode(&config.username)).await?;
        self.expect("334").await?;
        self.command(&b64.encode(&config.password)).await?;
        self.expect("235").await?;

        self.command(&format!("MAIL FROM:<{}>", config.from_email))
            .await?;
        self.expect("250").await?;
        self.command(&format!("RCPT TO:<{}>", message.to)).await?;
        self.expect("250").await?;

        self.command("DATA").await?;
        self.expect("354").await?;

        self.command(&format!("To: {}", message.to)).await?;
        self.command(&format!("Subject: {}", message.subject)).await?;
        for header in &message.headers {
            self.command(header).await?;
        }
        self.command("").await?;
        self.command(&dot_stuff(&message.body)).await?;
        self.command(".").await?;
        self.expect("250").await?;

        self.command("QUIT").await?;
        Ok(())
    }
}

/// Normalize line endings to CRLF and escape lines starting with '.'
/// per SMTP transparency rules.
fn dot_stuff(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for (i, line) in body.split('\n').enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with('.') {
            out.push('.');
        }
        out.push_str(line);
    }
    out
}

fn tls_connector() -> TlsConnector {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Deliver one message. Returns Ok(()) only when the server accepted it
/// with 250 after DATA.
pub async fn send_message(config: &SmtpConfig, message: &OutgoingMessage) -> io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "SMTP connect timed out"))??;

    let server_name = ServerName::try_from(config.host.clone())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid SMTP host name"))?;
    let ehlo_host = hostname();

    if config.port == 465 {
        // Implicit TLS: handshake first, then the whole SMTP dialog.
        let tls = tls_connector().connect(server_name, stream).await?;
        let mut session = SmtpSession::new(tls);
        session.expect("220").await?;
        session.command(&format!("EHLO {}", ehlo_host)).await?;
        session.expect("250").await?;
        session.authenticate_and_send(config, message).await
    } else {
        // Plain connection upgraded with STARTTLS before credentials.
        let mut session = SmtpSession::new(stream);
        session.expect("220").await?;
        session.command(&format!("EHLO {}", ehlo_host)).await?;
        let reply = session.expect("250").await?;
        if !reply.contains("STARTTLS") {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "server does not advertise STARTTLS",
            ));
        }
        session.command("STARTTLS").await?;
        session.expect("220").await?;

        let tls = tls_connector()
            .connect(server_name, session.into_inner())
            .await?;
        let mut session = SmtpSession::new(tls);
        session.command(&format!("EHLO {}", ehlo_host)).await?;
        session.expect("250").await?;
        session.authenticate_and_send(config, message).await
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn test_dot_stuffing() {
        assert_eq!(dot_stuff("hello\r\n.world"), "hello\r\n..world");
        assert_eq!(dot_stuff(".leading"), "..leading");
        assert_eq!(dot_stuff("no dots here"), "no dots here");
    }

    #[test]
    fn test_dot_stuffing_normalizes_bare_newlines() {
        assert_eq!(dot_stuff("hello\n.world"), "hello\r\n..world");
        assert_eq!(dot_stuff("plain\ntext\nlines"), "plain\r\ntext\r\nlines");
        assert_eq!(dot_stuff("already\r\ncrlf"), "already\r\ncrlf");
    }

    #[tokio::test]
    async fn test_multiline_reply_parsing() {
        let (client, mut server) = duplex(1024);
        let mut session = SmtpSession::new(client);
        server
            .write_all(b"250-smtp.example.com\r\n250-STARTTLS\r\n250 SIZE 35882577\r\n")
            .await
            .unwrap();
        let reply = session.read_reply().await.unwrap();
        assert!(reply.contains("STARTTLS"));
        assert!(reply.ends_with("250 SIZE 35882577"));
    }

    #[tokio::test]
    async fn test_expect_rejects_wrong_code() {
        let (client, mut server) = duplex(1024);
        let mut session = SmtpSession::new(client);
        server.write_all(b"554 go away\r\n").await.unwrap();
        assert!(session.expect("220").await.is_err());
    }

    #[tokio::test]
    async fn test_expect_accepts_greeting() {
        let (client, mut server) = duplex(1024);
        let mut session = SmtpSession::new(client);
        server
            .write_all(b"220 mail.example.com ESMTP\r\n")
            .await
            .unwrap();
        let reply = session.expect("220").await.unwrap();
        assert!(reply.contains("ESMTP"));
    }
}
