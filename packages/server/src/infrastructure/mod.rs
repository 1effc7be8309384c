//! Infrastructure layer: OSC encoding, transports and input adapters.

pub mod dto;
pub mod encoder;
pub mod listener;
pub mod osc;
pub mod sender;
