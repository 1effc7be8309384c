//! Connection-oriented transport shared by raw TCP and WebSocket.
//!
//! A `StreamSender` owns a bound listener and an accept loop task. Each
//! accepted connection runs the protocol's `new_client` hook, then gets a
//! writer task that drains its outbound queue and a reader task that watches
//! for disconnects and control traffic. Failures towards one client only
//! remove that client; so does a client whose queue fills up because it
//! stopped reading.

use std::{
    collections::HashMap,
    fmt,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    io::AsyncWriteExt,
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{
        Mutex,
        mpsc::{self, error::TrySendError},
    },
    task::JoinHandle,
};

use crate::domain::{OscSender, SendError, SenderKind};

use super::Endpoint;

/// Time a client gets to complete the protocol handshake
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Packets a client may have queued before it counts as stalled
pub const CLIENT_QUEUE_CAPACITY: usize = 64;

/// Outbound queue of already framed packets
pub type Outbound = mpsc::Sender<Arc<[u8]>>;

/// Framing and per-connection behavior of a stream transport
#[async_trait]
pub trait StreamProtocol: Send + Sync + 'static {
    /// Per-client data produced by a successful handshake
    type Handshake: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    const KIND: SenderKind;

    /// Runs on a fresh connection before it is opened
    async fn new_client(&self, stream: &mut TcpStream) -> Result<Self::Handshake, Self::Error>;

    /// Wrap one OSC packet for the wire
    fn frame(&self, packet: &[u8]) -> Result<Vec<u8>, SendError>;

    /// Consume client traffic until the client is gone. Replies go through
    /// `outbound` so they never interleave with frames.
    async fn read_loop(
        &self,
        reader: OwnedReadHalf,
        outbound: Outbound,
    ) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Handshaking,
    Open,
    Closing,
    Closed,
}

/// One connected client
pub struct ClientConnection<H> {
    id: ClientId,
    peer: SocketAddr,
    state: ConnectionState,
    handshake: Option<H>,
    outbound: Option<Outbound>,
    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl<H> ClientConnection<H> {
    fn new(id: ClientId, peer: SocketAddr) -> Self {
        Self {
            id,
            peer,
            state: ConnectionState::Handshaking,
            handshake: None,
            outbound: None,
            writer: None,
            reader: None,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn handshake(&self) -> Option<&H> {
        self.handshake.as_ref()
    }

    /// Drops the outbound queue, which ends the writer task, and stops the reader
    fn shutdown(&mut self) {
        self.state = ConnectionState::Closing;
        self.outbound = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.state = ConnectionState::Closed;
    }

    /// Like `shutdown`, but also drops whatever is still queued or being written
    fn abort(&mut self) {
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
        self.shutdown();
    }
}

type Registry<H> = Arc<Mutex<HashMap<ClientId, ClientConnection<H>>>>;

pub struct StreamSender<P: StreamProtocol> {
    protocol: Arc<P>,
    local_addr: SocketAddr,
    clients: Registry<P::Handshake>,
    accept_task: JoinHandle<()>,
    open: AtomicBool,
}

impl<P: StreamProtocol> StreamSender<P> {
    /// Bind the listener and start accepting clients
    pub async fn open(endpoint: &Endpoint, protocol: P) -> Result<Self, SendError> {
        let addr = endpoint.resolve().await?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| SendError::Bind {
                addr: endpoint.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        tracing::info!("{} sender listening on {}", P::KIND, local_addr);

        let protocol = Arc::new(protocol);
        let clients: Registry<P::Handshake> = Arc::new(Mutex::new(HashMap::new()));
        let accept_task = tokio::spawn(accept_loop(listener, protocol.clone(), clients.clone()));

        Ok(Self {
            protocol,
            local_addr,
            clients,
            accept_task,
            open: AtomicBool::new(true),
        })
    }

    /// Number of clients past the handshake
    pub async fn client_count(&self) -> usize {
        self.clients
            .lock()
            .await
            .values()
            .filter(|client| client.state == ConnectionState::Open)
            .count()
    }

    pub async fn client_peers(&self) -> Vec<SocketAddr> {
        self.clients
            .lock()
            .await
            .values()
            .filter(|client| client.state == ConnectionState::Open)
            .map(ClientConnection::peer)
            .collect()
    }
}

impl<P: StreamProtocol> Drop for StreamSender<P> {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

#[async_trait]
impl<P: StreamProtocol> OscSender for StreamSender<P> {
    fn kind(&self) -> SenderKind {
        P::KIND
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn send(&self, bundle: &[u8]) -> Result<usize, SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }
        let framed: Arc<[u8]> = self.protocol.frame(bundle)?.into();

        let mut clients = self.clients.lock().await;
        let mut attempted = 0;
        let mut gone = Vec::new();
        for client in clients.values() {
            if client.state != ConnectionState::Open {
                continue;
            }
            let Some(outbound) = &client.outbound else {
                continue;
            };
            attempted += 1;
            match outbound.try_send(framed.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => gone.push((client.id, true)),
                Err(TrySendError::Closed(_)) => gone.push((client.id, false)),
            }
        }
        for (id, stalled) in gone {
            if let Some(mut client) = clients.remove(&id) {
                client.abort();
                let reason = if stalled { "not reading" } else { "writer gone" };
                tracing::warn!(
                    "{} client {} ({}) dropped: {}",
                    P::KIND,
                    id,
                    client.peer,
                    reason
                );
            }
        }
        Ok(attempted)
    }

    async fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        self.accept_task.abort();
        let mut clients = self.clients.lock().await;
        for client in clients.values_mut() {
            client.shutdown();
        }
        let count = clients.len();
        clients.clear();
        tracing::info!(
            "{} sender on {} closed ({} client(s))",
            P::KIND,
            self.local_addr,
            count
        );
    }
}

async fn accept_loop<P: StreamProtocol>(
    listener: TcpListener,
    protocol: Arc<P>,
    clients: Registry<P::Handshake>,
) {
    let mut next_id = 0u64;
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                next_id += 1;
                let id = ClientId(next_id);
                clients
                    .lock()
                    .await
                    .insert(id, ClientConnection::new(id, peer));
                tokio::spawn(serve_client(id, stream, protocol.clone(), clients.clone()));
            }
            Err(e) => {
                tracing::warn!("Failed to accept {} connection: {}", P::KIND, e);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

async fn serve_client<P: StreamProtocol>(
    id: ClientId,
    mut stream: TcpStream,
    protocol: Arc<P>,
    clients: Registry<P::Handshake>,
) {
    let handshake = match tokio::time::timeout(HANDSHAKE_TIMEOUT, protocol.new_client(&mut stream))
        .await
    {
        Ok(Ok(handshake)) => handshake,
        Ok(Err(e)) => {
            remove_client(&clients, id, &format!("handshake failed: {e}"), P::KIND).await;
            return;
        }
        Err(_) => {
            remove_client(&clients, id, "handshake timed out", P::KIND).await;
            return;
        }
    };
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Failed to set TCP_NODELAY for client {}: {}", id, e);
    }

    let (reader, writer) = stream.into_split();
    let (outbound, rx) = mpsc::channel(CLIENT_QUEUE_CAPACITY);

    let mut registry = clients.lock().await;
    let Some(client) = registry.get_mut(&id) else {
        // Sender closed during the handshake
        return;
    };
    client.writer = Some(tokio::spawn(writer_loop(
        id,
        rx,
        writer,
        clients.clone(),
        P::KIND,
    )));
    client.reader = Some(tokio::spawn(reader_task(
        id,
        reader,
        outbound.clone(),
        protocol,
        clients.clone(),
    )));
    client.outbound = Some(outbound);
    client.handshake = Some(handshake);
    client.state = ConnectionState::Open;
    tracing::info!("{} client {} connected from {}", P::KIND, id, client.peer);
}

/// Drains the client's outbound queue; ends when the queue is dropped or a
/// write fails
async fn writer_loop<H: Send + 'static>(
    id: ClientId,
    mut rx: mpsc::Receiver<Arc<[u8]>>,
    mut writer: OwnedWriteHalf,
    clients: Registry<H>,
    kind: SenderKind,
) {
    while let Some(packet) = rx.recv().await {
        if let Err(e) = writer.write_all(&packet).await {
            remove_client(&clients, id, &format!("write failed: {e}"), kind).await;
            return;
        }
    }
    let _ = writer.shutdown().await;
}

async fn reader_task<P: StreamProtocol>(
    id: ClientId,
    reader: OwnedReadHalf,
    outbound: Outbound,
    protocol: Arc<P>,
    clients: Registry<P::Handshake>,
) {
    let reason = match protocol.read_loop(reader, outbound).await {
        Ok(()) => "disconnected".to_string(),
        Err(e) => format!("protocol error: {e}"),
    };
    remove_client(&clients, id, &reason, P::KIND).await;
}

async fn remove_client<H>(
    clients: &Mutex<HashMap<ClientId, ClientConnection<H>>>,
    id: ClientId,
    reason: &str,
    kind: SenderKind,
) {
    let removed = clients.lock().await.remove(&id);
    if let Some(mut client) = removed {
        client.shutdown();
        tracing::info!("{} client {} ({}) removed: {}", kind, id, client.peer, reason);
    }
}
