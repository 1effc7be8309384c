//! UDP transport: one datagram per bundle, unicast, broadcast or multicast.

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use tokio::{net::UdpSocket, sync::Mutex};

use crate::domain::{OscSender, SendError, SenderKind};

use super::Endpoint;

/// Largest UDP payload over IPv4
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Multicast hop limit; 1 keeps packets on the local network
pub const MULTICAST_TTL: u32 = 1;

pub struct UdpSender {
    /// Taken on close so the port is released right away
    socket: Mutex<Option<Arc<UdpSocket>>>,
    local_addr: SocketAddr,
    target: SocketAddr,
    open: AtomicBool,
}

impl UdpSender {
    pub async fn open(endpoint: &Endpoint) -> Result<Self, SendError> {
        let target = endpoint.resolve().await?;
        let local: SocketAddr = match target.ip() {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await.map_err(|source| SendError::Bind {
            addr: local.to_string(),
            source,
        })?;
        socket.set_broadcast(true)?;
        match target.ip() {
            IpAddr::V4(ip) if ip.is_multicast() => {
                socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
                socket.set_multicast_loop_v4(true)?;
            }
            IpAddr::V6(ip) if ip.is_multicast() => socket.set_multicast_loop_v6(true)?,
            _ => {}
        }
        let local_addr = socket.local_addr()?;
        tracing::info!("UDP sender targeting {} ({})", endpoint, target);
        Ok(Self {
            socket: Mutex::new(Some(Arc::new(socket))),
            local_addr,
            target,
            open: AtomicBool::new(true),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[async_trait]
impl OscSender for UdpSender {
    fn kind(&self) -> SenderKind {
        SenderKind::Udp
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.is_open().then_some(self.local_addr)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn send(&self, bundle: &[u8]) -> Result<usize, SendError> {
        let Some(socket) = self.socket.lock().await.clone() else {
            return Err(SendError::Closed);
        };
        if bundle.len() > MAX_DATAGRAM_SIZE {
            return Err(SendError::PayloadTooLarge {
                size: bundle.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        // Datagram loss is part of UDP semantics; a failed send is not fatal
        match socket.send_to(bundle, self.target).await {
            Ok(_) => Ok(1),
            Err(e) => {
                tracing::warn!("Failed to send UDP datagram to {}: {}", self.target, e);
                Ok(0)
            }
        }
    }

    async fn close(&self) {
        self.open.store(false, Ordering::Release);
        if self.socket.lock().await.take().is_some() {
            tracing::info!("UDP sender to {} closed", self.target);
        }
    }
}
