//! TUIO 2.0 frame encoding.
//!
//! One bundle per frame: `/tuio2/frm`, one message per transmitted
//! component in session id order, then `/tuio2/alv`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tuio_shared::time::{offset_micros, to_ntp_timetag};

use crate::{
    domain::{EncodeError, Entity, FrameDelta, PacketEncoder, SessionId, TuioTime},
    infrastructure::osc::{OscArg, OscBundle, OscMessage},
};

pub const FRM: &str = "/tuio2/frm";
pub const TOK: &str = "/tuio2/tok";
pub const PTR: &str = "/tuio2/ptr";
pub const BND: &str = "/tuio2/bnd";
pub const SYM: &str = "/tuio2/sym";
pub const SIG: &str = "/tuio2/sig";
pub const ALV: &str = "/tuio2/alv";

/// Sensor dimension in pixels, sent packed as `width << 16 | height`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: u16,
    pub height: u16,
}

impl Dimension {
    pub fn packed(&self) -> i32 {
        ((u32::from(self.width) << 16) | u32::from(self.height)) as i32
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Source field of the frame message, `name:instance@address`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    pub instance: u32,
    pub address: String,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: 0,
            address: "localhost".to_string(),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.name, self.instance, self.address)
    }
}

pub struct Tuio2Encoder {
    source: String,
    dimension: Dimension,
    session_start: DateTime<Utc>,
}

impl Tuio2Encoder {
    pub fn new(source: SourceDescriptor, dimension: Dimension, session_start: DateTime<Utc>) -> Self {
        Self {
            source: source.to_string(),
            dimension,
            session_start,
        }
    }

    fn timetag(&self, time: TuioTime) -> u64 {
        to_ntp_timetag(offset_micros(self.session_start, time.or(TuioTime::ZERO).micros()))
    }

    fn frame_message(&self, frame: &FrameDelta) -> OscMessage {
        OscMessage::new(FRM)
            .arg(frame.frame_id as i32)
            .arg(OscArg::TimeTag(self.timetag(frame.time)))
            .arg(self.dimension.packed())
            .arg(self.source.as_str())
    }
}

fn session_arg(session_id: SessionId) -> OscArg {
    OscArg::Int(session_id.value() as i32)
}

fn component_message(entity: &Entity) -> OscMessage {
    let component = entity.component();
    let motion = component.motion();
    match entity {
        Entity::Token(token) => OscMessage::new(TOK).args([
            session_arg(token.session_id()),
            OscArg::Int(token.type_user_id() as i32),
            OscArg::Int(token.symbol_id() as i32),
            OscArg::Float(component.x()),
            OscArg::Float(component.y()),
            OscArg::Float(component.angle()),
            OscArg::Float(motion.x_speed),
            OscArg::Float(motion.y_speed),
            OscArg::Float(motion.rotation_speed),
            OscArg::Float(motion.motion_accel),
            OscArg::Float(motion.rotation_accel),
        ]),
        Entity::Pointer(pointer) => {
            let shape = pointer.shape();
            OscMessage::new(PTR).args([
                session_arg(component.session_id()),
                OscArg::Int(pointer.type_user_id() as i32),
                OscArg::Int(pointer.component_id() as i32),
                OscArg::Float(component.x()),
                OscArg::Float(component.y()),
                OscArg::Float(component.angle()),
                OscArg::Float(shape.shear),
                OscArg::Float(shape.radius),
                OscArg::Float(shape.pressure),
                OscArg::Float(motion.x_speed),
                OscArg::Float(motion.y_speed),
                OscArg::Float(pointer.pressure_speed()),
                OscArg::Float(motion.motion_accel),
                OscArg::Float(pointer.pressure_accel()),
            ])
        }
        Entity::Bounds(bounds) => {
            let shape = bounds.shape();
            OscMessage::new(BND).args([
                session_arg(component.session_id()),
                OscArg::Float(component.x()),
                OscArg::Float(component.y()),
                OscArg::Float(component.angle()),
                OscArg::Float(shape.width),
                OscArg::Float(shape.height),
                OscArg::Float(shape.area),
                OscArg::Float(motion.x_speed),
                OscArg::Float(motion.y_speed),
                OscArg::Float(motion.rotation_speed),
                OscArg::Float(motion.motion_accel),
                OscArg::Float(motion.rotation_accel),
            ])
        }
        Entity::Symbol(symbol) => OscMessage::new(SYM).args([
            session_arg(component.session_id()),
            OscArg::Int(symbol.type_user_id() as i32),
            OscArg::Int(symbol.component_id() as i32),
            OscArg::Str(symbol.group().to_string()),
            OscArg::Str(symbol.data().to_string()),
        ]),
        Entity::Signal(signal) => OscMessage::new(SIG)
            .arg(session_arg(component.session_id()))
            .arg(signal.component_id() as i32)
            .args(signal.targets().iter().copied().map(session_arg)),
    }
}

impl PacketEncoder for Tuio2Encoder {
    fn encode(&self, frame: &FrameDelta) -> Result<Vec<u8>, EncodeError> {
        let mut bundle = OscBundle::new(self.timetag(frame.time));
        bundle.push(self.frame_message(frame));
        for entity in frame.transmitted() {
            bundle.push(component_message(entity));
        }
        bundle.push(OscMessage::new(ALV).args(frame.alive.iter().copied().map(session_arg)));
        bundle.encode()
    }
}
