//! Squelch client.
//!
//! Seals typed lines into envelopes, sends them through a relay and opens
//! whatever the relay delivers.
//!
//! # Architecture
//!
//! [`ClientSession`] is a Sans-IO state machine: it turns text into message
//! frames and relay frames into [`ClientEvent`]s. [`transport`] bridges a TCP
//! connection to frame channels, and [`run`] wires both to a line-oriented
//! terminal.
//!
//! # Components
//!
//! - [`ClientSession`]: handshake, sealing, opening
//! - [`SecretSource`] / [`load_secret`]: shared-secret resolution
//! - [`transport::connect`]: TCP transport
//! - [`run`]: interactive loop used by the `squelch` binary

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod event;
mod secret;
mod session;
pub mod transport;

use std::io::Write;

pub use error::ClientError;
pub use event::ClientEvent;
pub use secret::{KEY_ENV_VAR, SecretSource, load_secret};
pub use session::{ClientSession, SessionState};
use squelch_proto::Frame;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use transport::ConnectedClient;
use zeroize::Zeroizing;

/// Where to connect and who to be.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay address (`host:port`)
    pub server: String,
    /// Username to claim
    pub name: String,
    /// Recipient for direct routing; `None` on radio-net relays
    pub to: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { server: "127.0.0.1:7878".to_string(), name: String::new(), to: None }
    }
}

/// Connect, authenticate, then relay lines until `input` ends.
///
/// Each non-empty line of `input` is sealed and sent. Opened messages are
/// written to `output` as `<from> text`, relay errors as `! reason`.
///
/// # Errors
///
/// - `Io` if the relay is unreachable or `input`/`output` fail
/// - `Rejected` if the relay refuses the handshake
/// - `Disconnected` if the relay closes the connection
/// - `Envelope` if the recipient name contains a NUL byte
pub async fn run<R, W>(
    config: &ClientConfig,
    secret: Zeroizing<Vec<u8>>,
    input: R,
    mut output: W,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut conn = transport::connect(&config.server).await?;
    let mut session = ClientSession::new(secret, &config.name, config.to.as_deref());

    if let Err(e) = handshake(&mut session, &mut conn).await {
        conn.stop();
        return Err(e);
    }

    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("input closed");
                    break;
                };
                if line.is_empty() {
                    continue;
                }
                send(&conn, session.compose(&line)?).await?;
            },
            frame = conn.from_server.recv() => {
                let Some(frame) = frame else {
                    conn.stop();
                    return Err(ClientError::Disconnected);
                };
                match session.handle_frame(&frame) {
                    Ok(event) => render(event, &mut output)?,
                    Err(e) => tracing::warn!("dropping frame from relay: {e}"),
                }
            },
        }
    }

    conn.close().await;
    Ok(())
}

/// Wait for the greeting, claim our username and wait for the verdict.
async fn handshake(
    session: &mut ClientSession,
    conn: &mut ConnectedClient,
) -> Result<(), ClientError> {
    loop {
        let Some(frame) = conn.from_server.recv().await else {
            return Err(ClientError::Disconnected);
        };

        match session.handle_frame(&frame)? {
            ClientEvent::Greeting { mode } => {
                tracing::info!("relay mode: {mode}");
                send(conn, session.auth_frame()).await?;
            },
            ClientEvent::Authenticated { username } => {
                tracing::info!("authenticated as {username}");
                return Ok(());
            },
            ClientEvent::ServerError(reason) => return Err(ClientError::Rejected(reason)),
            other => tracing::debug!("ignoring {other:?} during handshake"),
        }
    }
}

async fn send(conn: &ConnectedClient, frame: Frame) -> Result<(), ClientError> {
    conn.to_server.send(frame).await.map_err(|_| ClientError::Disconnected)
}

fn render<W: Write>(event: ClientEvent, output: &mut W) -> Result<(), ClientError> {
    match event {
        ClientEvent::Message { from, text } => writeln!(output, "<{from}> {text}")?,
        ClientEvent::ServerError(reason) => writeln!(output, "! {reason}")?,
        ClientEvent::Rejected { from } => {
            tracing::warn!("message from {from} failed to open");
            return Ok(());
        },
        ClientEvent::Greeting { .. } | ClientEvent::Authenticated { .. } | ClientEvent::Ignored => {
            return Ok(());
        },
    }

    output.flush()?;
    Ok(())
}
