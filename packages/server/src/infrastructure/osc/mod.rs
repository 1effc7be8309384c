//! Minimal OSC 1.0 packet encoding.
//!
//! Only what the TUIO sender needs: int32, float32, string, blob and time tag
//! arguments, messages and single-level bundles. All numbers are big-endian
//! and every element is padded to a multiple of four bytes.

use crate::domain::EncodeError;

/// Header that starts every OSC bundle
pub const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// One OSC argument
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Str(String),
    Blob(Vec<u8>),
    TimeTag(u64),
}

impl OscArg {
    fn type_tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
            OscArg::Str(_) => 's',
            OscArg::Blob(_) => 'b',
            OscArg::TimeTag(_) => 't',
        }
    }
}

impl From<i32> for OscArg {
    fn from(value: i32) -> Self {
        OscArg::Int(value)
    }
}

impl From<f32> for OscArg {
    fn from(value: f32) -> Self {
        OscArg::Float(value)
    }
}

impl From<&str> for OscArg {
    fn from(value: &str) -> Self {
        OscArg::Str(value.to_string())
    }
}

impl From<String> for OscArg {
    fn from(value: String) -> Self {
        OscArg::Str(value)
    }
}

/// An OSC message: address pattern plus typed arguments
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OscArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = OscArg>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        if !self.address.starts_with('/') {
            return Err(EncodeError::InvalidAddress(self.address.clone()));
        }
        let mut out = Vec::with_capacity(self.address.len() + 8 + self.args.len() * 4);
        write_string(&mut out, &self.address)?;

        let mut tags = String::with_capacity(self.args.len() + 1);
        tags.push(',');
        tags.extend(self.args.iter().map(OscArg::type_tag));
        write_string(&mut out, &tags)?;

        for arg in &self.args {
            match arg {
                OscArg::Int(value) => out.extend_from_slice(&value.to_be_bytes()),
                OscArg::Float(value) => out.extend_from_slice(&value.to_be_bytes()),
                OscArg::Str(value) => write_string(&mut out, value)?,
                OscArg::Blob(bytes) => write_blob(&mut out, bytes)?,
                OscArg::TimeTag(value) => out.extend_from_slice(&value.to_be_bytes()),
            }
        }
        Ok(out)
    }
}

/// A bundle of messages sharing one time tag
#[derive(Debug, Clone, PartialEq)]
pub struct OscBundle {
    pub timetag: u64,
    pub messages: Vec<OscMessage>,
}

impl OscBundle {
    pub fn new(timetag: u64) -> Self {
        Self {
            timetag,
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: OscMessage) {
        self.messages.push(message);
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(16 + self.messages.len() * 64);
        out.extend_from_slice(BUNDLE_TAG);
        out.extend_from_slice(&self.timetag.to_be_bytes());
        for message in &self.messages {
            let element = message.encode()?;
            out.extend_from_slice(&size_prefix(element.len())?);
            out.extend_from_slice(&element);
        }
        Ok(out)
    }
}

fn size_prefix(len: usize) -> Result<[u8; 4], EncodeError> {
    i32::try_from(len)
        .map(i32::to_be_bytes)
        .map_err(|_| EncodeError::ElementTooLarge(len))
}

fn pad(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn write_string(out: &mut Vec<u8>, value: &str) -> Result<(), EncodeError> {
    if value.as_bytes().contains(&0) {
        return Err(EncodeError::NulInString(value.to_string()));
    }
    out.extend_from_slice(value.as_bytes());
    out.push(0);
    pad(out);
    Ok(())
}

fn write_blob(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), EncodeError> {
    out.extend_from_slice(&size_prefix(bytes.len())?);
    out.extend_from_slice(bytes);
    pad(out);
    Ok(())
}


/// Decoder for the subset written above, used to inspect encoded frames in tests
#[cfg(test)]
pub(crate) mod decode {
    use super::{BUNDLE_TAG, OscArg, OscMessage};

    fn read_i32(bytes: &[u8], at: &mut usize) -> i32 {
        let value = i32::from_be_bytes(bytes[*at..*at + 4].try_into().unwrap());
        *at += 4;
        value
    }

    fn read_string(bytes: &[u8], at: &mut usize) -> String {
        let end = bytes[*at..].iter().position(|b| *b == 0).unwrap() + *at;
        let value = String::from_utf8(bytes[*at..end].to_vec()).unwrap();
        *at = (end + 4) & !3;
        value
    }

    pub(crate) fn message(bytes: &[u8]) -> OscMessage {
        let mut at = 0;
        let address = read_string(bytes, &mut at);
        let tags = read_string(bytes, &mut at);
        let mut message = OscMessage::new(address);
        for tag in tags.chars().skip(1) {
            let arg = match tag {
                'i' => OscArg::Int(read_i32(bytes, &mut at)),
                'f' => OscArg::Float(f32::from_bits(read_i32(bytes, &mut at) as u32)),
                's' => OscArg::Str(read_string(bytes, &mut at)),
                't' => {
                    let high = read_i32(bytes, &mut at) as u32 as u64;
                    let low = read_i32(bytes, &mut at) as u32 as u64;
                    OscArg::TimeTag((high << 32) | low)
                }
                'b' => {
                    let size = read_i32(bytes, &mut at) as usize;
                    let blob = bytes[at..at + size].to_vec();
                    at = (at + size + 3) & !3;
                    OscArg::Blob(blob)
                }
                other => panic!("unexpected type tag {other}"),
            };
            message.args.push(arg);
        }
        message
    }

    /// Split a bundle into its time tag and messages
    pub(crate) fn bundle(bytes: &[u8]) -> (u64, Vec<OscMessage>) {
        assert_eq!(&bytes[..8], BUNDLE_TAG);
        let timetag = u64::from_be_bytes(bytes[8..16].try_into().unwrap());
        let mut at = 16;
        let mut messages = Vec::new();
        while at < bytes.len() {
            let size = read_i32(bytes, &mut at) as usize;
            messages.push(message(&bytes[at..at + size]));
            at += size;
        }
        (timetag, messages)
    }
}
