//! TCP transport for the client.
//!
//! Provides [`ConnectedClient`], which bridges a relay connection to a pair of
//! frame channels. Protocol logic stays in the Sans-IO [`ClientSession`].
//!
//! [`ClientSession`]: crate::ClientSession

use squelch_proto::{Frame, ProtocolError, read_frame, write_frame};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc,
    task::JoinHandle,
};

use crate::ClientError;

/// Frames buffered in each direction
const CHANNEL_CAPACITY: usize = 32;

/// Handle to a live relay connection.
///
/// Dropping `to_server` shuts the write side down once queued frames are
/// written. `from_server` yields `None` once the relay closes the connection.
pub struct ConnectedClient {
    /// Send frames to the relay.
    pub to_server: mpsc::Sender<Frame>,
    /// Receive frames from the relay.
    pub from_server: mpsc::Receiver<Frame>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ConnectedClient {
    /// Stop both connection tasks immediately, discarding queued frames.
    pub fn stop(&self) {
        self.reader.abort();
        self.writer.abort();
    }

    /// Flush queued frames, shut the socket down and stop reading.
    pub async fn close(self) {
        let Self { to_server, from_server, reader, writer } = self;
        drop(to_server);

        if let Err(e) = writer.await {
            tracing::debug!("writer task ended abnormally: {e}");
        }

        reader.abort();
        drop(from_server);
    }
}

/// Connect to a relay at `server_addr` (`host:port`).
///
/// # Errors
///
/// - `Io` if the TCP connection cannot be established
pub async fn connect(server_addr: &str) -> Result<ConnectedClient, ClientError> {
    let stream = TcpStream::connect(server_addr).await?;
    stream.set_nodelay(true)?;
    tracing::debug!("connected to {server_addr}");

    let (read_half, write_half) = stream.into_split();
    let (to_server_tx, to_server_rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);

    let reader = tokio::spawn(read_loop(BufReader::new(read_half), from_server_tx));
    let writer = tokio::spawn(write_loop(write_half, to_server_rx));

    Ok(ConnectedClient { to_server: to_server_tx, from_server: from_server_rx, reader, writer })
}

/// Forward decoded frames until EOF or a fatal read error.
async fn read_loop(mut reader: BufReader<OwnedReadHalf>, from_server: mpsc::Sender<Frame>) {
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(frame)) => {
                if from_server.send(frame).await.is_err() {
                    break;
                }
            },
            Ok(None) => {
                tracing::debug!("relay closed the connection");
                break;
            },
            Err(e @ (ProtocolError::Io(_) | ProtocolError::LineTooLong { .. })) => {
                tracing::warn!("connection lost: {e}");
                break;
            },
            Err(e) => tracing::warn!("dropping malformed frame from relay: {e}"),
        }
    }
}

/// Write queued frames until the sender side is dropped.
async fn write_loop(mut writer: OwnedWriteHalf, mut to_server: mpsc::Receiver<Frame>) {
    while let Some(frame) = to_server.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame).await {
            tracing::warn!("send failed: {e}");
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        tracing::debug!("shutdown failed: {e}");
    }
}
