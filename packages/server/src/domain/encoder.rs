//! Packet encoder trait: one frame delta in, one OSC bundle out.

use super::{error::EncodeError, session_table::FrameDelta};

pub trait PacketEncoder: Send + Sync {
    fn encode(&self, frame: &FrameDelta) -> Result<Vec<u8>, EncodeError>;
}
