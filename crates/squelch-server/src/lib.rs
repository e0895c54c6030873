//! Squelch relay server.
//!
//! Production runtime around the Sans-IO [`RelayDriver`]: Tokio for the async
//! runtime and plain TCP for transport.
//!
//! # Architecture
//!
//! [`RelayDriver`] holds all relay logic and performs no I/O. [`Server`]
//! owns the sockets, feeds the driver [`RelayEvent`]s and executes the
//! [`RelayAction`]s it returns.
//!
//! Each connection gets two tasks:
//!
//! - a reader that decodes lines into frames and hands them to the driver
//! - a writer fed by a bounded channel, so a slow client cannot stall the
//!   relay; frames for a full channel are dropped with a warning
//!
//! # Components
//!
//! - [`RelayDriver`]: handshake, routing and labels (pure logic)
//! - [`ConnectionRegistry`]: session ↔ username mapping
//! - [`PeerLabels`]: per-receiver sender labels for radio-net mode
//! - [`Server`]: TCP runtime

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod error;
mod labels;
mod registry;
mod username;

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

pub use driver::{
    DEFAULT_MAX_CONNECTIONS, DriverConfig, LogLevel, RelayAction, RelayDriver, RelayEvent,
    RoutingPolicy,
};
pub use error::ServerError;
pub use labels::{DEFAULT_MAX_LABELS, PeerLabels};
pub use registry::{ConnectionRegistry, SessionInfo};
use squelch_proto::{Frame, ProtocolError, read_frame, write_frame};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, Notify, RwLock, mpsc},
};
pub use username::{MAX_USERNAME_LEN, UsernameError, validate_username};

/// Frames queued per connection before new ones are dropped
pub const OUTBOUND_QUEUE_LEN: usize = 256;

/// Per-session handles owned by the runtime.
struct SessionHandle {
    /// Outbound frames; dropping the sender ends the writer task
    outbound: mpsc::Sender<Frame>,
    /// Wakes the reader task when the driver closes the session
    close: Arc<Notify>,
}

/// Shared state for all connections.
struct SharedState {
    /// Map of session ID to its outbound queue and close signal
    sessions: RwLock<HashMap<u64, SessionHandle>>,
}

/// Relay configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind to (e.g., "127.0.0.1:7878")
    pub bind_address: String,
    /// Driver configuration (routing policy, limits)
    pub driver: DriverConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1:7878".to_string(), driver: DriverConfig::default() }
    }
}

/// Production Squelch relay.
///
/// Wraps `RelayDriver` with a TCP listener.
pub struct Server {
    /// The action-based relay driver
    driver: RelayDriver,
    /// Bound listener
    listener: TcpListener,
}

impl Server {
    /// Validate `config` and bind the listener.
    pub async fn bind(config: RelayConfig) -> Result<Self, ServerError> {
        if config.driver.max_connections == 0 {
            return Err(ServerError::Config("max connections must be at least 1".to_string()));
        }
        if config.driver.max_labels == 0 {
            return Err(ServerError::Config("max labels must be at least 1".to_string()));
        }

        let listener = TcpListener::bind(&config.bind_address).await?;
        let driver = RelayDriver::new(config.driver);

        Ok(Self { driver, listener })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the relay, accepting connections and routing frames.
    ///
    /// This method runs until the task is cancelled.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(
            addr = %self.local_addr()?,
            mode = self.driver.config().policy.mode(),
            "relay starting"
        );

        let driver = Arc::new(Mutex::new(self.driver));
        let shared = Arc::new(SharedState { sessions: RwLock::new(HashMap::new()) });
        let next_session = AtomicU64::new(1);

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let session_id = next_session.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(session_id, %peer, "accepted connection");

                    let driver = Arc::clone(&driver);
                    let shared = Arc::clone(&shared);

                    tokio::spawn(async move {
                        handle_connection(session_id, stream, driver, shared).await;
                    });
                },
                Err(e) => {
                    tracing::error!("accept error: {e}");
                },
            }
        }
    }
}

/// Drive one TCP connection from accept to close.
async fn handle_connection(
    session_id: u64,
    stream: TcpStream,
    driver: Arc<Mutex<RelayDriver>>,
    shared: Arc<SharedState>,
) {
    let (read_half, write_half) = stream.into_split();
    let (outbound, queue) = mpsc::channel(OUTBOUND_QUEUE_LEN);
    let close = Arc::new(Notify::new());

    tokio::spawn(write_loop(session_id, write_half, queue));

    {
        let mut sessions = shared.sessions.write().await;
        sessions.insert(session_id, SessionHandle { outbound, close: Arc::clone(&close) });
    }

    dispatch(&driver, &shared, RelayEvent::ConnectionAccepted { session_id }).await;

    let reason = read_loop(session_id, read_half, &driver, &shared, &close).await;

    {
        let mut sessions = shared.sessions.write().await;
        sessions.remove(&session_id);
    }

    dispatch(&driver, &shared, RelayEvent::ConnectionClosed { session_id, reason }).await;
}

/// Read frames until EOF, a fatal read error, or a close request.
///
/// Returns the close reason.
async fn read_loop(
    session_id: u64,
    read_half: OwnedReadHalf,
    driver: &Mutex<RelayDriver>,
    shared: &SharedState,
    close: &Notify,
) -> String {
    let mut reader = BufReader::new(read_half);

    loop {
        let result = tokio::select! {
            result = read_frame(&mut reader) => result,
            () = close.notified() => return "closed by relay".to_string(),
        };

        let event = match result {
            Ok(Some(frame)) => RelayEvent::FrameReceived { session_id, frame },
            Ok(None) => return "peer disconnected".to_string(),
            Err(ProtocolError::Io(e)) => return format!("read failed: {e}"),
            Err(error) => {
                tracing::warn!(session_id, %error, "rejected line");
                RelayEvent::FrameRejected { session_id, error }
            },
        };

        dispatch(driver, shared, event).await;
    }
}

/// Drain the outbound queue into the socket.
///
/// Ends when every sender is dropped or a write fails, then shuts the socket
/// down so the peer sees EOF after the last queued frame.
async fn write_loop(session_id: u64, mut writer: OwnedWriteHalf, mut queue: mpsc::Receiver<Frame>) {
    while let Some(frame) = queue.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame).await {
            tracing::debug!(session_id, "write failed: {e}");
            break;
        }
    }

    if let Err(e) = writer.shutdown().await {
        tracing::debug!(session_id, "shutdown failed: {e}");
    }
}

/// Run one event through the driver and execute the resulting actions.
async fn dispatch(driver: &Mutex<RelayDriver>, shared: &SharedState, event: RelayEvent) {
    let actions = {
        let mut driver = driver.lock().await;
        driver.process_event(event)
    };

    execute_actions(actions, shared).await;
}

/// Execute relay actions.
async fn execute_actions(actions: Vec<RelayAction>, shared: &SharedState) {
    for action in actions {
        match action {
            RelayAction::SendToSession { session_id, frame } => {
                let sessions = shared.sessions.read().await;
                let Some(handle) = sessions.get(&session_id) else {
                    tracing::debug!(session_id, "send to departed session dropped");
                    continue;
                };

                match handle.outbound.try_send(frame) {
                    Ok(()) => {},
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(session_id, "outbound queue full, frame dropped");
                    },
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!(session_id, "outbound queue closed, frame dropped");
                    },
                }
            },

            RelayAction::CloseConnection { session_id, reason } => {
                tracing::info!(session_id, "closing connection: {reason}");
                let mut sessions = shared.sessions.write().await;
                if let Some(handle) = sessions.remove(&session_id) {
                    handle.close.notify_one();
                }
            },

            RelayAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{message}"),
                LogLevel::Info => tracing::info!("{message}"),
                LogLevel::Warn => tracing::warn!("{message}"),
                LogLevel::Error => tracing::error!("{message}"),
            },
        }
    }
}
