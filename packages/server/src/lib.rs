//! TUIO 2.0 tracking server.
//!
//! Tracked entities (tokens, pointers, bounds, symbols and signals) are kept
//! in a session table, committed frame by frame, encoded as TUIO 2.0 OSC
//! bundles and delivered over UDP, TCP or WebSocket.
//!
//! Layers follow the usual split:
//! - `domain`: entities, session identity and the sender/encoder traits
//! - `usecase`: the session manager driving commits and fan-out
//! - `infrastructure`: OSC encoding, transports, input DTOs
//! - `ui`: configuration, input handling and the server runner

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
