//! RFC 6455 frame encoding and decoding.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Payloads up to this size fit in the 7-bit length field
const MAX_SHORT_LENGTH: usize = 125;

/// Control frames carry at most 125 bytes
pub const MAX_CONTROL_PAYLOAD: usize = MAX_SHORT_LENGTH;

/// Largest client frame accepted; clients only send control traffic
pub const MAX_CLIENT_PAYLOAD: u64 = 64 * 1024;

/// Close status for a protocol violation
pub const CLOSE_PROTOCOL_ERROR: u16 = 1002;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    pub fn to_u8(self) -> u8 {
        match self {
            Opcode::Continuation => 0x0,
            Opcode::Text => 0x1,
            Opcode::Binary => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, FrameError> {
        match value {
            0x0 => Ok(Opcode::Continuation),
            0x1 => Ok(Opcode::Text),
            0x2 => Ok(Opcode::Binary),
            0x8 => Ok(Opcode::Close),
            0x9 => Ok(Opcode::Ping),
            0xA => Ok(Opcode::Pong),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }

    pub fn is_control(self) -> bool {
        matches!(self, Opcode::Close | Opcode::Ping | Opcode::Pong)
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("reserved bits set")]
    ReservedBits,

    #[error("unknown opcode {0:#x}")]
    UnknownOpcode(u8),

    #[error("client frame is not masked")]
    Unmasked,

    #[error("invalid control frame")]
    InvalidControlFrame,

    #[error("payload of {0} bytes is too large")]
    PayloadTooLarge(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded frame with its payload already unmasked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Status code of a Close frame, if it carries one
    pub fn close_code(&self) -> Option<u16> {
        match (self.opcode, self.payload.as_slice()) {
            (Opcode::Close, [high, low, ..]) => Some(u16::from_be_bytes([*high, *low])),
            _ => None,
        }
    }
}

fn write_header(out: &mut Vec<u8>, opcode: Opcode, len: usize, masked: bool) {
    out.push(0x80 | opcode.to_u8());
    let mask_bit = if masked { 0x80 } else { 0x00 };
    if len <= MAX_SHORT_LENGTH {
        out.push(mask_bit | len as u8);
    } else if let Ok(len) = u16::try_from(len) {
        out.push(mask_bit | 126);
        out.extend_from_slice(&len.to_be_bytes());
    } else {
        out.push(mask_bit | 127);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }
}

/// Single unmasked FIN frame, as a server sends it
pub fn encode(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 10);
    write_header(&mut out, opcode, payload.len(), false);
    out.extend_from_slice(payload);
    out
}

/// Single masked FIN frame, as a client sends it
pub fn encode_masked(opcode: Opcode, payload: &[u8], mask: [u8; 4]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 14);
    write_header(&mut out, opcode, payload.len(), true);
    out.extend_from_slice(&mask);
    out.extend(payload.iter().enumerate().map(|(i, b)| b ^ mask[i % 4]));
    out
}

/// Close frame carrying a status code
pub fn encode_close(code: u16) -> Vec<u8> {
    encode(Opcode::Close, &code.to_be_bytes())
}

/// Read one frame. `Ok(None)` means the stream ended cleanly between frames.
///
/// With `require_mask` an unmasked frame is a protocol violation, as it is
/// for every frame a client sends.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    require_mask: bool,
) -> Result<Option<Frame>, FrameError> {
    let mut head = [0u8; 2];
    match reader.read_exact(&mut head).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let fin = head[0] & 0x80 != 0;
    if head[0] & 0x70 != 0 {
        return Err(FrameError::ReservedBits);
    }
    let opcode = Opcode::from_u8(head[0] & 0x0F)?;
    let masked = head[1] & 0x80 != 0;
    if require_mask && !masked {
        return Err(FrameError::Unmasked);
    }

    let len = match head[1] & 0x7F {
        126 => u64::from(reader.read_u16().await?),
        127 => reader.read_u64().await?,
        short => u64::from(short),
    };
    if opcode.is_control() && (!fin || len > MAX_CONTROL_PAYLOAD as u64) {
        return Err(FrameError::InvalidControlFrame);
    }
    if require_mask && len > MAX_CLIENT_PAYLOAD {
        return Err(FrameError::PayloadTooLarge(len));
    }
    let len = usize::try_from(len).map_err(|_| FrameError::PayloadTooLarge(len))?;

    let mut mask = [0u8; 4];
    if masked {
        reader.read_exact(&mut mask).await?;
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    if masked {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= mask[i % 4];
        }
    }

    Ok(Some(Frame {
        fin,
        opcode,
        payload,
    }))
}
