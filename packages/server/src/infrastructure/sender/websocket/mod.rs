//! WebSocket transport (RFC 6455) implemented on plain TCP streams.
//!
//! Only the server side needed to push binary frames: the upgrade
//! handshake, unmasked binary frames out, and control frames in.

pub mod frame;
pub mod handshake;
pub mod protocol;

pub use frame::{Frame, FrameError, Opcode};
pub use handshake::{HandshakeError, WebSocketHandshake, accept_key};
pub use protocol::{WebSocketError, WebSocketProtocol, WebSocketSender};
