//! Client error types.

use std::path::PathBuf;

use squelch_crypto::CryptoError;
use squelch_proto::ProtocolError;
use thiserror::Error;

/// Errors that can occur in the client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No key material was supplied.
    #[error("no key material: pass --key, --key-file or set SQUELCH_KEY")]
    MissingSecret,

    /// Key material resolved to zero bytes.
    #[error("key material is empty")]
    EmptySecret,

    /// Key file could not be read.
    #[error("failed to read key file {}: {source}", path.display())]
    KeyFile {
        /// Path that was tried
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Frame could not be read or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Message payload is not a well-formed envelope.
    ///
    /// A format problem, distinct from an envelope that fails to open.
    #[error("malformed envelope: {0}")]
    Envelope(#[from] CryptoError),

    /// Connection or terminal I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Relay refused the handshake.
    #[error("rejected by relay: {0}")]
    Rejected(String),

    /// Relay closed the connection.
    #[error("relay closed the connection")]
    Disconnected,
}
