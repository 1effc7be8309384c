//! Transport trait for delivering encoded bundles.
//!
//! Concrete transports live in the infrastructure layer (dependency inversion):
//! the session manager only depends on this trait.

use std::{fmt, net::SocketAddr};

use async_trait::async_trait;

use super::error::SendError;

/// Transport family of a sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenderKind {
    Udp,
    Tcp,
    WebSocket,
}

impl fmt::Display for SenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderKind::Udp => f.write_str("udp"),
            SenderKind::Tcp => f.write_str("tcp"),
            SenderKind::WebSocket => f.write_str("websocket"),
        }
    }
}

/// A transport that delivers OSC bundles to its peers.
///
/// `send` returns the number of peers delivery was attempted on. A failure
/// towards one peer drops that peer and never fails the whole call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OscSender: Send + Sync {
    fn kind(&self) -> SenderKind;

    /// Local address of the socket or listener
    fn local_addr(&self) -> Option<SocketAddr>;

    fn is_open(&self) -> bool;

    async fn send(&self, bundle: &[u8]) -> Result<usize, SendError>;

    /// Release every resource; further sends fail with `SendError::Closed`
    async fn close(&self);
}
