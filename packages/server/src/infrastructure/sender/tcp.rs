//! Raw TCP transport.
//!
//! By default bundles go out back to back with no framing of their own.
//! Clients that need packet boundaries can ask for OSC 1.0 stream framing,
//! where every packet is preceded by its size as a big-endian int32.

use std::io;

use async_trait::async_trait;
use tokio::{
    io::AsyncReadExt,
    net::{TcpStream, tcp::OwnedReadHalf},
};

use crate::domain::{SendError, SenderKind};

use super::{
    Endpoint,
    stream::{Outbound, StreamProtocol, StreamSender},
};

/// OSC packets over a plain byte stream, no handshake
#[derive(Debug, Clone, Copy, Default)]
pub struct RawStream {
    size_prefix: bool,
}

impl RawStream {
    pub fn new(size_prefix: bool) -> Self {
        Self { size_prefix }
    }

    pub fn size_prefix(&self) -> bool {
        self.size_prefix
    }
}

pub type TcpSender = StreamSender<RawStream>;

impl StreamSender<RawStream> {
    /// Bundles are written as is
    pub async fn tcp(endpoint: &Endpoint) -> Result<Self, SendError> {
        Self::open(endpoint, RawStream::default()).await
    }

    /// Every bundle is preceded by its int32 size
    pub async fn tcp_size_prefixed(endpoint: &Endpoint) -> Result<Self, SendError> {
        Self::open(endpoint, RawStream::new(true)).await
    }
}

#[async_trait]
impl StreamProtocol for RawStream {
    type Handshake = ();
    type Error = io::Error;

    const KIND: SenderKind = SenderKind::Tcp;

    async fn new_client(&self, _stream: &mut TcpStream) -> Result<(), io::Error> {
        Ok(())
    }

    fn frame(&self, packet: &[u8]) -> Result<Vec<u8>, SendError> {
        if !self.size_prefix {
            return Ok(packet.to_vec());
        }
        let size = i32::try_from(packet.len()).map_err(|_| SendError::PayloadTooLarge {
            size: packet.len(),
            max: i32::MAX as usize,
        })?;
        let mut framed = Vec::with_capacity(packet.len() + 4);
        framed.extend_from_slice(&size.to_be_bytes());
        framed.extend_from_slice(packet);
        Ok(framed)
    }

    async fn read_loop(
        &self,
        mut reader: OwnedReadHalf,
        _outbound: Outbound,
    ) -> Result<(), io::Error> {
        // Clients have nothing to say; read only to notice the disconnect
        let mut buf = [0u8; 1024];
        while reader.read(&mut buf).await? > 0 {}
        Ok(())
    }
}
