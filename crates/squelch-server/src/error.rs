//! Server error types.

use thiserror::Error;

/// Errors that can occur in the relay runtime.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error (zero limits, etc.).
    ///
    /// Fatal: prevents startup. Fix configuration and restart.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/network error (bind failure, accept failure, I/O error).
    ///
    /// May be transient (network issues) or fatal (bind address in use).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
