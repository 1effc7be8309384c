//! TUIO 2.0 tracking server.
//!
//! Reads JSON-lines tracking events on stdin and serves TUIO 2.0 bundles
//! over the configured transports.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tuio-server
//! cargo run --bin tuio-server -- --websocket 0.0.0.0:8080 --udp 127.0.0.1:3333 --fps 30
//! cargo run --bin tuio-server -- --config server.json --no-heartbeat
//! ```

use std::path::PathBuf;

use clap::Parser;
use tuio_server::{
    infrastructure::sender::Endpoint,
    ui::{DEFAULT_TUIO_PORT, Server, ServerConfig, TcpTransport, TransportConfig},
};
use tuio_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tuio-server")]
#[command(about = "TUIO 2.0 tracking server over UDP, TCP and WebSocket", long_about = None)]
struct Args {
    /// JSON configuration file; flags below override it
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Send UDP datagrams to host[:port] (repeatable, port defaults to 3333)
    #[arg(long, value_name = "HOST[:PORT]", value_parser = tuio_endpoint)]
    udp: Vec<Endpoint>,

    /// Listen for raw TCP clients on host[:port] (repeatable, port defaults to 3333)
    #[arg(long, value_name = "HOST[:PORT]", value_parser = tuio_endpoint)]
    tcp: Vec<Endpoint>,

    /// Precede every bundle sent to --tcp clients with its int32 size
    #[arg(long)]
    tcp_size_prefix: bool,

    /// Listen for WebSocket clients on host:port (repeatable)
    #[arg(long, value_name = "HOST:PORT")]
    websocket: Vec<Endpoint>,

    /// Frames per second committed by the timer; 0 commits only on input events
    #[arg(long)]
    fps: Option<u32>,

    /// Do not send frames in which nothing changed
    #[arg(long)]
    no_heartbeat: bool,

    /// Send every alive entity in every frame
    #[arg(long)]
    full_update: bool,

    /// Source name reported in frame messages
    #[arg(long)]
    source_name: Option<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Parse `host:port`, falling back to the TUIO port for a bare host
fn tuio_endpoint(value: &str) -> Result<Endpoint, String> {
    match value.parse::<Endpoint>() {
        Ok(endpoint) => Ok(endpoint),
        Err(_) if !value.contains(':') && !value.is_empty() => {
            Ok(Endpoint::new(value, DEFAULT_TUIO_PORT))
        }
        Err(e) => Err(e.to_string()),
    }
}

impl Args {
    fn into_config(self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };

        let size_prefix = self.tcp_size_prefix;
        let transports: Vec<TransportConfig> = self
            .udp
            .into_iter()
            .map(TransportConfig::Udp)
            .chain(self.tcp.into_iter().map(|endpoint| {
                TransportConfig::Tcp(TcpTransport {
                    endpoint,
                    size_prefix,
                })
            }))
            .chain(self.websocket.into_iter().map(TransportConfig::Websocket))
            .collect();
        if !transports.is_empty() {
            config.transports = transports;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if self.no_heartbeat {
            config.heartbeat = false;
        }
        if self.full_update {
            config.full_update = true;
        }
        if let Some(source_name) = self.source_name {
            config.source_name = source_name;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    for transport in &config.transports {
        tracing::debug!("Configured transport: {:?}", transport);
    }

    if let Err(e) = Server::new(config).run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
