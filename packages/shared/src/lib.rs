//! Shared utilities for the TUIO server packages.
//!
//! - `logger`: tracing subscriber setup for binaries
//! - `time`: wall-clock and NTP time tag helpers

pub mod logger;
pub mod time;
