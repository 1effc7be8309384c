//! JSON-lines tracking input.
//!
//! One event per line, tagged by `kind`:
//!
//! ```json
//! {"kind":"token","symbol_id":5,"x":0.1,"y":0.1,"angle":0.0}
//! {"kind":"pointer","key":1,"x":0.5,"y":0.5,"pressure":0.8}
//! {"kind":"retire","session_id":1}
//! {"kind":"commit"}
//! ```
//!
//! `time` is optional everywhere (seconds since session start); when omitted
//! the server clock is used.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Observation, Sample, SessionId, TrackError, TuioTime};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid source event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Track(#[from] TrackError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSample {
    #[serde(default)]
    pub time: Option<f64>,
    pub symbol_id: u32,
    #[serde(default)]
    pub type_id: u16,
    #[serde(default)]
    pub user_id: u16,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    #[serde(default)]
    pub time: Option<f64>,
    pub key: u64,
    #[serde(default)]
    pub type_id: u16,
    #[serde(default)]
    pub user_id: u16,
    #[serde(default)]
    pub component_id: u32,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub shear: f32,
    #[serde(default)]
    pub radius: f32,
    #[serde(default)]
    pub pressure: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsSample {
    #[serde(default)]
    pub time: Option<f64>,
    pub key: u64,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub area: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSample {
    #[serde(default)]
    pub time: Option<f64>,
    pub key: u64,
    #[serde(default)]
    pub type_id: u16,
    #[serde(default)]
    pub user_id: u16,
    #[serde(default)]
    pub component_id: u32,
    pub group: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSample {
    #[serde(default)]
    pub time: Option<f64>,
    pub key: u64,
    #[serde(default)]
    pub component_id: u32,
    #[serde(default)]
    pub targets: Vec<i64>,
}

/// One line of tracking input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceEvent {
    Token(TokenSample),
    Pointer(PointerSample),
    Bounds(BoundsSample),
    Symbol(SymbolSample),
    Signal(SignalSample),
    Retire {
        session_id: i64,
    },
    Stop {
        session_id: i64,
        #[serde(default)]
        time: Option<f64>,
    },
    Commit {
        #[serde(default)]
        time: Option<f64>,
    },
}

/// What the server does with a decoded event
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCommand {
    Observe(Observation),
    Retire(SessionId),
    Stop(SessionId, TuioTime),
    Commit(TuioTime),
}

impl SourceEvent {
    pub fn parse(line: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Resolve into a command; events without a time happen at `now`
    pub fn into_command(self, now: TuioTime) -> Result<SourceCommand, SourceError> {
        let at = |time: Option<f64>| time.map(TuioTime::from_secs_f64).unwrap_or(now);
        let command = match self {
            SourceEvent::Token(sample) => {
                SourceCommand::Observe(Observation::new(at(sample.time), Sample::from(sample)))
            }
            SourceEvent::Pointer(sample) => {
                SourceCommand::Observe(Observation::new(at(sample.time), Sample::from(sample)))
            }
            SourceEvent::Bounds(sample) => {
                SourceCommand::Observe(Observation::new(at(sample.time), Sample::from(sample)))
            }
            SourceEvent::Symbol(sample) => {
                SourceCommand::Observe(Observation::new(at(sample.time), Sample::from(sample)))
            }
            SourceEvent::Signal(sample) => {
                let time = at(sample.time);
                SourceCommand::Observe(Observation::new(time, Sample::try_from(sample)?))
            }
            SourceEvent::Retire { session_id } => {
                SourceCommand::Retire(SessionId::new(session_id)?)
            }
            SourceEvent::Stop { session_id, time } => {
                SourceCommand::Stop(SessionId::new(session_id)?, at(time))
            }
            SourceEvent::Commit { time } => SourceCommand::Commit(at(time)),
        };
        Ok(command)
    }
}
