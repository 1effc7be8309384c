//! Samples pushed by a tracking source.

use super::{
    entity::{BoundsShape, ComponentKind, PointerShape, check_text},
    error::TrackError,
    time::TuioTime,
    value_object::{Point, SessionId},
};

/// Key identifying the same physical entity across samples.
///
/// Tokens are matched by what tag they carry; every other variant by a
/// correlation key chosen by the tracking source (e.g. a blob or finger id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NaturalKey {
    Token {
        symbol_id: u32,
        type_id: u16,
        user_id: u16,
    },
    Correlated {
        kind: ComponentKind,
        key: u64,
    },
}

/// Variant-specific content of one sample
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Token {
        symbol_id: u32,
        type_id: u16,
        user_id: u16,
        position: Point,
        angle: f32,
    },
    Pointer {
        key: u64,
        type_id: u16,
        user_id: u16,
        component_id: u32,
        position: Point,
        angle: f32,
        shape: PointerShape,
    },
    Bounds {
        key: u64,
        position: Point,
        angle: f32,
        shape: BoundsShape,
    },
    Symbol {
        key: u64,
        type_id: u16,
        user_id: u16,
        component_id: u32,
        group: String,
        data: String,
    },
    Signal {
        key: u64,
        component_id: u32,
        targets: Vec<SessionId>,
    },
}

impl Sample {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Sample::Token { .. } => ComponentKind::Token,
            Sample::Pointer { .. } => ComponentKind::Pointer,
            Sample::Bounds { .. } => ComponentKind::Bounds,
            Sample::Symbol { .. } => ComponentKind::Symbol,
            Sample::Signal { .. } => ComponentKind::Signal,
        }
    }

    /// Check the content can be serialized before it reaches the table
    pub fn validate(&self) -> Result<(), TrackError> {
        match self {
            Sample::Symbol { group, data, .. } => {
                check_text(group)?;
                check_text(data)
            }
            _ => Ok(()),
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        match self {
            Sample::Token {
                symbol_id,
                type_id,
                user_id,
                ..
            } => NaturalKey::Token {
                symbol_id: *symbol_id,
                type_id: *type_id,
                user_id: *user_id,
            },
            Sample::Pointer { key, .. }
            | Sample::Bounds { key, .. }
            | Sample::Symbol { key, .. }
            | Sample::Signal { key, .. } => NaturalKey::Correlated {
                kind: self.kind(),
                key: *key,
            },
        }
    }
}

/// One timestamped sample
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub time: TuioTime,
    pub sample: Sample,
}

impl Observation {
    pub fn new(time: TuioTime, sample: Sample) -> Self {
        Self { time, sample }
    }

    /// Token sample with type and user ids defaulted to zero
    pub fn token(time: TuioTime, symbol_id: u32, position: Point, angle: f32) -> Self {
        Self::new(
            time,
            Sample::Token {
                symbol_id,
                type_id: 0,
                user_id: 0,
                position,
                angle,
            },
        )
    }
}
