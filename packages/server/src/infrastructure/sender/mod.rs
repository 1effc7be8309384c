//! Transport implementations of [`OscSender`](crate::domain::OscSender).

pub mod stream;
pub mod tcp;
pub mod udp;
pub mod websocket;

use std::{net::SocketAddr, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::SendError;

pub use stream::{ClientConnection, ClientId, ConnectionState, StreamProtocol, StreamSender};
pub use tcp::{RawStream, TcpSender};
pub use udp::UdpSender;
pub use websocket::{WebSocketProtocol, WebSocketSender};

/// Host and port of a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// First socket address the host resolves to
    pub async fn resolve(&self) -> Result<SocketAddr, SendError> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|_| SendError::InvalidAddress(self.to_string()))?
            .next()
            .ok_or_else(|| SendError::InvalidAddress(self.to_string()))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = SendError;

    /// Parses `host:port`; IPv6 hosts may be bracketed
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| SendError::InvalidAddress(s.to_string()))?;
        let port = port
            .parse()
            .map_err(|_| SendError::InvalidAddress(s.to_string()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(SendError::InvalidAddress(s.to_string()));
        }
        Ok(Self::new(host, port))
    }
}
