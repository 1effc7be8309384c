//! UI layer: configuration, the tracking input handler and the server runner.

pub mod config;
pub mod runner;
pub mod signal;
pub mod source;

pub use config::{DEFAULT_TUIO_PORT, ServerConfig, TcpTransport, TransportConfig};
pub use runner::{BoxError, Server, ServerError};
