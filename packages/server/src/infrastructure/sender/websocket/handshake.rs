//! HTTP/1.1 upgrade handshake.

use base64::{Engine, engine::general_purpose::STANDARD};
use sha1::{Digest, Sha1};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Fixed GUID appended to the client key before hashing
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Upper bound on the size of the upgrade request
pub const MAX_REQUEST_SIZE: usize = 8 * 1024;

pub const BAD_REQUEST_RESPONSE: &str =
    "HTTP/1.1 400 Bad Request\r\nConnection: close\r\nContent-Length: 0\r\n\r\n";

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("request exceeds {} bytes", MAX_REQUEST_SIZE)]
    TooLarge,

    #[error("connection closed before the request was complete")]
    Incomplete,

    #[error("malformed request line '{0}'")]
    MalformedRequestLine(String),

    #[error("method {0} is not GET")]
    MethodNotAllowed(String),

    #[error("missing 'Upgrade: websocket' header")]
    MissingUpgrade,

    #[error("missing Sec-WebSocket-Key header")]
    MissingKey,

    #[error("Sec-WebSocket-Key '{0}' is not 16 base64-encoded bytes")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a received upgrade request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketHandshake {
    key: String,
    accept: String,
}

impl WebSocketHandshake {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let accept = accept_key(&key);
        Self { key, accept }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn accept(&self) -> &str {
        &self.accept
    }

    pub fn response(&self) -> String {
        format!(
            "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {}\r\n\r\n",
            self.accept
        )
    }
}

/// base64(SHA-1(key + GUID))
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Read up to the blank line ending the request head.
///
/// Reads one byte at a time so nothing past the head is consumed; a client
/// may send its first frame right behind the request.
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, HandshakeError> {
    let mut request = Vec::with_capacity(512);
    let mut byte = [0u8; 1];
    while !request.ends_with(b"\r\n\r\n") {
        if request.len() >= MAX_REQUEST_SIZE {
            return Err(HandshakeError::TooLarge);
        }
        if reader.read(&mut byte).await? == 0 {
            return Err(HandshakeError::Incomplete);
        }
        request.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&request).into_owned())
}

/// Validate an upgrade request head
pub fn parse_request(request: &str) -> Result<WebSocketHandshake, HandshakeError> {
    let mut lines = request.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(_target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HandshakeError::MalformedRequestLine(request_line.to_string()));
    };
    if !version.starts_with("HTTP/1.") {
        return Err(HandshakeError::MalformedRequestLine(request_line.to_string()));
    }
    if method != "GET" {
        return Err(HandshakeError::MethodNotAllowed(method.to_string()));
    }

    let mut upgrade = false;
    let mut key = None;
    for line in lines.take_while(|line| !line.is_empty()) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.trim().eq_ignore_ascii_case("upgrade") {
            upgrade = value
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("websocket"));
        } else if name.trim().eq_ignore_ascii_case("sec-websocket-key") {
            key = Some(value.to_string());
        }
    }

    if !upgrade {
        return Err(HandshakeError::MissingUpgrade);
    }
    let key = key.ok_or(HandshakeError::MissingKey)?;
    match STANDARD.decode(&key) {
        Ok(bytes) if bytes.len() == 16 => Ok(WebSocketHandshake::new(key)),
        _ => Err(HandshakeError::InvalidKey(key)),
    }
}
