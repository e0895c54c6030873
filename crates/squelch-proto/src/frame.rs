//! Line frame codec.
//!
//! A `Frame` is one line of text on the wire: a one-character type, a decimal
//! version and a base64 payload, separated by single spaces and terminated by
//! `\n`.
//!
//! The payload is opaque here. `M` frames carry a routed envelope, the other
//! known types carry short UTF-8 strings (see [`Frame::payload_text`]).

use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;

use crate::errors::{ProtocolError, Result};

/// Frame type, keyed by its wire character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// `H`: relay greeting
    Hello,
    /// `A`: authentication request / confirmation
    Auth,
    /// `M`: routed message envelope
    Message,
    /// `E`: error report
    Error,
    /// Any other character; decoded so it can be skipped
    Unknown(char),
}

impl FrameType {
    /// Map a wire character to a frame type.
    pub fn from_char(c: char) -> Self {
        match c {
            'H' => Self::Hello,
            'A' => Self::Auth,
            'M' => Self::Message,
            'E' => Self::Error,
            other => Self::Unknown(other),
        }
    }

    /// Wire character for this type.
    pub fn as_char(self) -> char {
        match self {
            Self::Hello => 'H',
            Self::Auth => 'A',
            Self::Message => 'M',
            Self::Error => 'E',
            Self::Unknown(c) => c,
        }
    }
}

/// One protocol frame.
///
/// # Invariants
///
/// - `frame_type.as_char()` is never a space, `\n` or `\r` for frames
///   produced by [`Frame::decode`]. Frames built by hand with one of those
///   types encode to a line that does not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame type
    pub frame_type: FrameType,
    /// Protocol version
    pub version: u32,
    /// Raw payload bytes
    pub payload: Bytes,
}

impl Frame {
    /// Version written by this implementation
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a frame at the current version.
    #[must_use]
    pub fn new(frame_type: FrameType, payload: impl Into<Bytes>) -> Self {
        Self { frame_type, version: Self::CURRENT_VERSION, payload: payload.into() }
    }

    /// Relay greeting announcing the routing mode.
    pub fn hello(mode: &str) -> Self {
        Self::new(FrameType::Hello, format!("squelch {mode}"))
    }

    /// Authentication frame carrying a username.
    pub fn auth(username: &str) -> Self {
        Self::new(FrameType::Auth, username.to_owned())
    }

    /// Message frame carrying a routed envelope.
    pub fn message(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameType::Message, payload)
    }

    /// Error frame carrying a reason.
    pub fn error(reason: &str) -> Self {
        Self::new(FrameType::Error, reason.to_owned())
    }

    /// Encode as one wire line, including the trailing `\n`.
    pub fn encode(&self) -> String {
        format!("{} {} {}\n", self.frame_type.as_char(), self.version, STANDARD.encode(&self.payload))
    }

    /// Decode one wire line.
    ///
    /// A single trailing `\n` (optionally preceded by `\r`) is stripped.
    ///
    /// # Errors
    ///
    /// - `FieldCount` if the line does not have three space-separated fields
    /// - `InvalidType` if the type is not one character, or is a separator or
    ///   line ending
    /// - `InvalidVersion` if the version is not plain decimal fitting `u32`
    /// - `InvalidPayload` if the payload is not valid base64
    pub fn decode(line: &str) -> Result<Self> {
        let line = match line.strip_suffix('\n') {
            Some(stripped) => stripped.strip_suffix('\r').unwrap_or(stripped),
            None => line,
        };

        let mut fields = line.splitn(3, ' ');
        let (Some(type_field), Some(version_field), Some(payload_field)) =
            (fields.next(), fields.next(), fields.next())
        else {
            let found = line.splitn(3, ' ').count();
            return Err(ProtocolError::FieldCount { found });
        };

        let frame_type = parse_type(type_field)?;
        let version = parse_version(version_field)?;
        let payload = STANDARD
            .decode(payload_field)
            .map_err(|e| ProtocolError::InvalidPayload(e.to_string()))?;

        Ok(Self { frame_type, version, payload: Bytes::from(payload) })
    }

    /// Decode raw line bytes, rejecting non-UTF-8 input.
    ///
    /// # Errors
    ///
    /// - `InvalidUtf8` if the bytes are not UTF-8
    /// - Any error from [`Frame::decode`]
    pub fn decode_bytes(line: &[u8]) -> Result<Self> {
        let line = std::str::from_utf8(line).map_err(|_| ProtocolError::InvalidUtf8)?;
        Self::decode(line)
    }

    /// Payload as UTF-8 text, for `H`, `A` and `E` frames.
    ///
    /// # Errors
    ///
    /// - `InvalidUtf8` if the payload is not UTF-8
    pub fn payload_text(&self) -> Result<&str> {
        std::str::from_utf8(&self.payload).map_err(|_| ProtocolError::InvalidUtf8)
    }
}

fn parse_type(field: &str) -> Result<FrameType> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !matches!(c, ' ' | '\n' | '\r') => Ok(FrameType::from_char(c)),
        _ => Err(ProtocolError::InvalidType(field.to_owned())),
    }
}

fn parse_version(field: &str) -> Result<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::InvalidVersion(field.to_owned()));
    }
    field.parse().map_err(|_| ProtocolError::InvalidVersion(field.to_owned()))
}
