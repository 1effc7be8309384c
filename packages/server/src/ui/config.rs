//! Server configuration.
//!
//! Loaded from an optional JSON file; every field has a default so a partial
//! file (or none at all) is valid:
//!
//! ```json
//! {
//!   "transports": [
//!     { "type": "websocket", "host": "127.0.0.1", "port": 8080 },
//!     { "type": "udp", "host": "127.0.0.1", "port": 3333 },
//!     { "type": "tcp", "host": "0.0.0.0", "port": 3333, "size_prefix": false }
//!   ],
//!   "fps": 60,
//!   "heartbeat": true
//! }
//! ```

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    infrastructure::{
        encoder::Dimension,
        sender::{
            Endpoint,
            websocket::protocol::{DEFAULT_HOST, DEFAULT_PORT},
        },
    },
    usecase::SessionOptions,
};

/// Conventional TUIO port for UDP and TCP
pub const DEFAULT_TUIO_PORT: u16 = 3333;

pub const DEFAULT_FPS: u32 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// TCP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpTransport {
    #[serde(flatten)]
    pub endpoint: Endpoint,
    /// Precede every bundle with its int32 size (OSC 1.0 stream framing)
    #[serde(default)]
    pub size_prefix: bool,
}

impl TcpTransport {
    pub fn raw(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            size_prefix: false,
        }
    }
}

/// One transport to open at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    Udp(Endpoint),
    Tcp(TcpTransport),
    Websocket(Endpoint),
}

impl TransportConfig {
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            TransportConfig::Udp(endpoint) | TransportConfig::Websocket(endpoint) => endpoint,
            TransportConfig::Tcp(tcp) => &tcp.endpoint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub transports: Vec<TransportConfig>,
    /// Frames committed per second by the timer; 0 commits only on `commit` events
    pub fps: u32,
    pub heartbeat: bool,
    pub full_update: bool,
    pub source_name: String,
    pub dimension: Dimension,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transports: vec![TransportConfig::Websocket(Endpoint::new(
                DEFAULT_HOST,
                DEFAULT_PORT,
            ))],
            fps: DEFAULT_FPS,
            heartbeat: true,
            full_update: false,
            source_name: "tuio-server".to_string(),
            dimension: Dimension::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Period of the frame timer, if one runs
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(self.fps)))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            heartbeat: self.heartbeat,
            full_update: self.full_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // テスト項目: 既定値は WebSocket 127.0.0.1:8080、60fps、heartbeat 有効
        // given (前提条件):
        let config = ServerConfig::default();

        // when (操作):
        let interval = config.frame_interval();

        // then (期待する結果):
        assert_eq!(
            config.transports,
            vec![TransportConfig::Websocket(Endpoint::new("127.0.0.1", 8080))]
        );
        assert_eq!(interval, Some(Duration::from_secs_f64(1.0 / 60.0)));
        assert!(config.session_options().heartbeat);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        // テスト項目: JSON で省略された項目は既定値になる
        // given (前提条件):
        let json = r#"{
            "transports": [
                { "type": "udp", "host": "239.0.0.1", "port": 3333 },
                { "type": "tcp", "host": "0.0.0.0", "port": 3334 },
                { "type": "tcp", "host": "0.0.0.0", "port": 3335, "size_prefix": true }
            ],
            "fps": 0,
            "heartbeat": false
        }"#;

        // when (操作):
        let config = ServerConfig::from_json(json).unwrap();

        // then (期待する結果):
        assert_eq!(config.transports.len(), 3);
        assert_eq!(
            config.transports[0],
            TransportConfig::Udp(Endpoint::new("239.0.0.1", DEFAULT_TUIO_PORT))
        );
        assert_eq!(
            config.transports[1],
            TransportConfig::Tcp(TcpTransport::raw(Endpoint::new("0.0.0.0", 3334)))
        );
        assert_eq!(
            config.transports[2],
            TransportConfig::Tcp(TcpTransport {
                endpoint: Endpoint::new("0.0.0.0", 3335),
                size_prefix: true,
            })
        );
        assert_eq!(config.frame_interval(), None);
        assert!(!config.heartbeat);
        assert_eq!(config.source_name, "tuio-server");
        assert_eq!(config.dimension, Dimension::default());
    }

    #[test]
    fn test_unknown_transport_is_rejected() {
        // テスト項目: 未知のトランスポート種別は設定エラーになる
        // given (前提条件):
        let json = r#"{ "transports": [{ "type": "serial", "host": "x", "port": 1 }] }"#;

        // when (操作):
        let result = ServerConfig::from_json(json);

        // then (期待する結果):
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
