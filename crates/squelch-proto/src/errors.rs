//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while reading, decoding or interpreting frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Line does not have exactly three space-separated fields
    #[error("expected 3 space-separated fields, found {found}")]
    FieldCount {
        /// Number of fields present
        found: usize,
    },

    /// Type field is not a single character other than space, `\n` or `\r`
    #[error("invalid frame type: {0:?}")]
    InvalidType(String),

    /// Version field is not an unsigned 32-bit decimal
    #[error("invalid frame version: {0:?}")]
    InvalidVersion(String),

    /// Payload field is not valid base64
    #[error("invalid payload encoding: {0}")]
    InvalidPayload(String),

    /// Line is not valid UTF-8
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    /// Line exceeds the reader's bound
    #[error("line exceeds {max} bytes")]
    LineTooLong {
        /// Maximum accepted line length
        max: usize,
    },

    /// Message payload has no NUL-terminated route prefix
    #[error("message payload is missing its route")]
    MissingRoute,

    /// Route prefix is not valid UTF-8
    #[error("message route is not valid UTF-8")]
    InvalidRoute,

    /// Underlying stream failed
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
