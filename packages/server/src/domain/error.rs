//! Domain layer errors.

use thiserror::Error;

use super::{entity::ComponentKind, time::TuioTime, value_object::SessionId};

/// Errors raised by component and session table operations.
///
/// Every variant leaves the component or table it was raised on unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    /// Sample is older than the component's last update
    #[error("time {given} is earlier than current time {current} of session {session_id}")]
    NonMonotonicTime {
        session_id: SessionId,
        current: TuioTime,
        given: TuioTime,
    },

    /// Component was already removed
    #[error("session {0} has been removed")]
    ComponentRemoved(SessionId),

    /// Session id is already used by a live component
    #[error("session {0} is already alive")]
    DuplicateSession(SessionId),

    /// Session id outside the wire range
    #[error("invalid session id {0}")]
    InvalidSessionId(i64),

    /// Variant kind not known to the server
    #[error("unknown component kind '{0}'")]
    UnknownKind(String),

    /// No live component with this session id
    #[error("session {0} not found")]
    UnknownSession(SessionId),

    /// Symbol text that cannot travel as an OSC string
    #[error("symbol text contains a NUL byte: {0:?}")]
    NulInText(String),

    /// Sample variant differs from the live component's variant
    #[error("session {session_id} is a {existing}, got a {given} sample")]
    KindMismatch {
        session_id: SessionId,
        existing: ComponentKind,
        given: ComponentKind,
    },
}

/// Errors raised while serializing a frame
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// OSC strings cannot contain NUL bytes
    #[error("OSC string contains a NUL byte: {0:?}")]
    NulInString(String),

    /// OSC address patterns start with '/'
    #[error("invalid OSC address '{0}'")]
    InvalidAddress(String),

    /// Element larger than an OSC int32 size field
    #[error("OSC element of {0} bytes is too large")]
    ElementTooLarge(usize),
}

/// Errors raised by transports
#[derive(Debug, Error)]
pub enum SendError {
    /// Listener or socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Host:port could not be resolved
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// Bundle exceeds what the transport can carry in one unit
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    /// Sender was closed
    #[error("sender is closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
