//! Server execution logic.

use std::{future::Future, sync::Arc};

use thiserror::Error;
use tokio::io::{AsyncBufRead, BufReader};
use tuio_shared::time::{now_utc, to_rfc3339};

use crate::{
    domain::{Clock, OscSender, SendError, SystemClock},
    infrastructure::{
        encoder::{SourceDescriptor, Tuio2Encoder},
        listener::LoggingListener,
        sender::{TcpSender, UdpSender, WebSocketSender},
    },
    usecase::SessionManager,
};

use super::{
    config::{ServerConfig, TransportConfig},
    signal::shutdown_signal,
    source::run_source,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("none of the {0} configured transport(s) could be opened")]
    NoTransport(usize),
}

/// TUIO tracking server
///
/// Opens the configured transports, reads tracking events from an input
/// stream and commits frames on a timer until shutdown.
pub struct Server {
    config: ServerConfig,
    clock: Arc<dyn Clock>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run on stdin until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<(), BoxError> {
        self.run_until(BufReader::new(tokio::io::stdin()), shutdown_signal())
            .await
    }

    /// Run on `input` until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns an error if no configured transport could be opened.
    pub async fn run_until<R, F>(self, input: R, shutdown: F) -> Result<(), BoxError>
    where
        R: AsyncBufRead + Unpin + Send,
        F: Future<Output = ()> + Send,
    {
        let session_start = now_utc();
        let encoder = Tuio2Encoder::new(
            SourceDescriptor::new(self.config.source_name.clone()),
            self.config.dimension,
            session_start,
        );
        let manager = SessionManager::new(Arc::new(encoder), self.config.session_options());

        let senders = open_senders(&self.config.transports).await;
        if senders.is_empty() {
            return Err(ServerError::NoTransport(self.config.transports.len()).into());
        }
        for sender in senders {
            manager.add_sender(sender).await;
        }
        manager.add_listener(Arc::new(LoggingListener::new())).await;

        tracing::info!(
            "Tracking session started at {} ({} fps, heartbeat {}, full update {})",
            to_rfc3339(session_start),
            self.config.fps,
            if self.config.heartbeat { "on" } else { "off" },
            if self.config.full_update { "on" } else { "off" }
        );
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        let clock = self.clock.as_ref();
        let source = async {
            match run_source(input, &manager, clock).await {
                Ok(applied) => tracing::info!("Source ended after {} event(s)", applied),
                Err(e) => tracing::error!("Failed to read source: {}", e),
            }
            // Keep serving clients until shutdown
            std::future::pending::<()>().await;
        };
        let frames = async {
            let Some(period) = self.config.frame_interval() else {
                return std::future::pending::<()>().await;
            };
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = manager.commit_frame(clock.now()).await {
                    tracing::warn!("Failed to commit frame: {}", e);
                }
            }
        };

        tokio::select! {
            _ = shutdown => {}
            _ = source => {}
            _ = frames => {}
        }

        manager.close().await;
        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn open_sender(transport: &TransportConfig) -> Result<Arc<dyn OscSender>, SendError> {
    let sender: Arc<dyn OscSender> = match transport {
        TransportConfig::Udp(endpoint) => Arc::new(UdpSender::open(endpoint).await?),
        TransportConfig::Tcp(tcp) if tcp.size_prefix => {
            Arc::new(TcpSender::tcp_size_prefixed(&tcp.endpoint).await?)
        }
        TransportConfig::Tcp(tcp) => Arc::new(TcpSender::tcp(&tcp.endpoint).await?),
        TransportConfig::Websocket(endpoint) => {
            Arc::new(WebSocketSender::websocket(endpoint).await?)
        }
    };
    Ok(sender)
}

/// Open every configured transport, skipping the ones that fail
async fn open_senders(transports: &[TransportConfig]) -> Vec<Arc<dyn OscSender>> {
    let mut senders = Vec::with_capacity(transports.len());
    for transport in transports {
        match open_sender(transport).await {
            Ok(sender) => senders.push(sender),
            Err(e) => tracing::error!("Failed to open {:?}: {}", transport, e),
        }
    }
    senders
}
