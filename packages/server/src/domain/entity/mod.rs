//! Tracked entity variants.
//!
//! `Entity` is the closed set of variants the session table stores; every
//! operation dispatches with an exhaustive match.

mod bounds;
mod pointer;
mod signal;
mod symbol;
mod token;

use std::{fmt, str::FromStr};

pub use bounds::{Bounds, BoundsOptions, BoundsShape};
pub use pointer::{Pointer, PointerOptions, PointerShape};
pub use signal::{Signal, SignalOptions};
pub use symbol::{Symbol, SymbolOptions};
pub(crate) use symbol::check_text;
pub use token::{Token, TokenOptions};

use super::{
    component::{Component, UpdateOutcome},
    error::TrackError,
    observation::Sample,
    time::TuioTime,
    value_object::SessionId,
};

/// Discriminant of an entity variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Token,
    Pointer,
    Bounds,
    Symbol,
    Signal,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Token => "token",
            ComponentKind::Pointer => "pointer",
            ComponentKind::Bounds => "bounds",
            ComponentKind::Symbol => "symbol",
            ComponentKind::Signal => "signal",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" | "tok" => Ok(ComponentKind::Token),
            "pointer" | "ptr" => Ok(ComponentKind::Pointer),
            "bounds" | "bnd" => Ok(ComponentKind::Bounds),
            "symbol" | "sym" => Ok(ComponentKind::Symbol),
            "signal" | "sig" => Ok(ComponentKind::Signal),
            _ => Err(TrackError::UnknownKind(s.to_string())),
        }
    }
}

/// A live tracked entity of any variant
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Token(Token),
    Pointer(Pointer),
    Bounds(Bounds),
    Symbol(Symbol),
    Signal(Signal),
}

impl Entity {
    /// Create the entity a first sample describes
    pub fn from_sample(session_id: SessionId, time: TuioTime, sample: &Sample) -> Entity {
        match sample {
            Sample::Token {
                symbol_id,
                type_id,
                user_id,
                position,
                angle,
            } => Entity::Token(Token::new(
                TokenOptions::full(session_id, *type_id, *user_id, *symbol_id, *position, *angle)
                    .at(time),
            )),
            Sample::Pointer {
                type_id,
                user_id,
                component_id,
                position,
                angle,
                shape,
                ..
            } => Entity::Pointer(Pointer::new(PointerOptions {
                session_id,
                type_id: *type_id,
                user_id: *user_id,
                component_id: *component_id,
                position: *position,
                angle: *angle,
                shape: *shape,
                time,
            })),
            Sample::Bounds {
                position,
                angle,
                shape,
                ..
            } => Entity::Bounds(Bounds::new(BoundsOptions {
                session_id,
                position: *position,
                angle: *angle,
                shape: *shape,
                time,
            })),
            Sample::Symbol {
                type_id,
                user_id,
                component_id,
                group,
                data,
                ..
            } => Entity::Symbol(Symbol::new(SymbolOptions {
                session_id,
                type_id: *type_id,
                user_id: *user_id,
                component_id: *component_id,
                group: group.clone(),
                data: data.clone(),
                time,
            })),
            Sample::Signal {
                component_id,
                targets,
                ..
            } => Entity::Signal(Signal::new(SignalOptions {
                session_id,
                component_id: *component_id,
                targets: targets.clone(),
                time,
            })),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Entity::Token(_) => ComponentKind::Token,
            Entity::Pointer(_) => ComponentKind::Pointer,
            Entity::Bounds(_) => ComponentKind::Bounds,
            Entity::Symbol(_) => ComponentKind::Symbol,
            Entity::Signal(_) => ComponentKind::Signal,
        }
    }

    pub fn component(&self) -> &Component {
        match self {
            Entity::Token(token) => token.component(),
            Entity::Pointer(pointer) => pointer.component(),
            Entity::Bounds(bounds) => bounds.component(),
            Entity::Symbol(symbol) => symbol.component(),
            Entity::Signal(signal) => signal.component(),
        }
    }

    pub(crate) fn component_mut(&mut self) -> &mut Component {
        match self {
            Entity::Token(token) => token.component_mut(),
            Entity::Pointer(pointer) => pointer.component_mut(),
            Entity::Bounds(bounds) => bounds.component_mut(),
            Entity::Symbol(symbol) => symbol.component_mut(),
            Entity::Signal(signal) => signal.component_mut(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.component().session_id()
    }

    /// Apply a follow-up sample of the same variant
    pub fn apply(&mut self, time: TuioTime, sample: &Sample) -> Result<UpdateOutcome, TrackError> {
        match (self, sample) {
            (
                Entity::Token(token),
                Sample::Token {
                    position, angle, ..
                },
            ) => token.update(time, *position, *angle),
            (
                Entity::Pointer(pointer),
                Sample::Pointer {
                    position,
                    angle,
                    shape,
                    ..
                },
            ) => pointer.update(time, *position, *angle, *shape),
            (
                Entity::Bounds(bounds),
                Sample::Bounds {
                    position,
                    angle,
                    shape,
                    ..
                },
            ) => bounds.update(time, *position, *angle, *shape),
            (Entity::Symbol(symbol), Sample::Symbol { group, data, .. }) => {
                symbol.update(time, group, data)
            }
            (
                Entity::Signal(signal),
                Sample::Signal {
                    component_id,
                    targets,
                    ..
                },
            ) => signal.update(time, *component_id, targets),
            (entity, sample) => Err(TrackError::KindMismatch {
                session_id: entity.session_id(),
                existing: entity.kind(),
                given: sample.kind(),
            }),
        }
    }

    pub fn stop(&mut self, time: TuioTime) -> Result<UpdateOutcome, TrackError> {
        match self {
            Entity::Pointer(pointer) => pointer.stop(time),
            other => other.component_mut().stop(time),
        }
    }
}
