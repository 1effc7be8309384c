//! WebSocket flavor of the stream transport.

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpStream, tcp::OwnedReadHalf},
};

use crate::{
    domain::{SendError, SenderKind},
    infrastructure::sender::{
        Endpoint,
        stream::{Outbound, StreamProtocol, StreamSender},
    },
};

use super::{
    frame::{self, CLOSE_PROTOCOL_ERROR, FrameError, Opcode},
    handshake::{self, BAD_REQUEST_RESPONSE, HandshakeError, WebSocketHandshake},
};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum WebSocketError {
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketProtocol;

pub type WebSocketSender = StreamSender<WebSocketProtocol>;

impl StreamSender<WebSocketProtocol> {
    pub async fn websocket(endpoint: &Endpoint) -> Result<Self, SendError> {
        Self::open(endpoint, WebSocketProtocol).await
    }
}

#[async_trait]
impl StreamProtocol for WebSocketProtocol {
    type Handshake = WebSocketHandshake;
    type Error = WebSocketError;

    const KIND: SenderKind = SenderKind::WebSocket;

    async fn new_client(
        &self,
        stream: &mut TcpStream,
    ) -> Result<WebSocketHandshake, WebSocketError> {
        let parsed = match handshake::read_request(stream).await {
            Ok(request) => handshake::parse_request(&request),
            Err(e) => Err(e),
        };
        match parsed {
            Ok(handshake) => {
                stream.write_all(handshake.response().as_bytes()).await?;
                Ok(handshake)
            }
            Err(e) => {
                // Best effort; the connection is dropped either way
                let _ = stream.write_all(BAD_REQUEST_RESPONSE.as_bytes()).await;
                let _ = stream.shutdown().await;
                Err(e.into())
            }
        }
    }

    fn frame(&self, packet: &[u8]) -> Result<Vec<u8>, SendError> {
        Ok(frame::encode(Opcode::Binary, packet))
    }

    async fn read_loop(
        &self,
        mut reader: OwnedReadHalf,
        outbound: Outbound,
    ) -> Result<(), WebSocketError> {
        loop {
            let frame = match frame::read_frame(&mut reader, true).await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(()),
                Err(FrameError::Io(e)) => return Err(e.into()),
                Err(e) => {
                    let _ = outbound
                        .send(frame::encode_close(CLOSE_PROTOCOL_ERROR).into())
                        .await;
                    return Err(e.into());
                }
            };
            match frame.opcode {
                Opcode::Close => {
                    // Echo the status code back, then let the writer finish
                    let reply = match frame.close_code() {
                        Some(code) => frame::encode_close(code),
                        None => frame::encode(Opcode::Close, &[]),
                    };
                    let _ = outbound.send(reply.into()).await;
                    return Ok(());
                }
                Opcode::Ping => {
                    let _ = outbound
                        .send(frame::encode(Opcode::Pong, &frame.payload).into())
                        .await;
                }
                opcode => tracing::trace!(
                    "Ignoring {:?} frame of {} bytes",
                    opcode,
                    frame.payload.len()
                ),
            }
        }
    }
}
