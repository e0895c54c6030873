//! Squelch Wire Protocol
//!
//! One frame per line:
//!
//! ```text
//! <TYPE> SP <VERSION> SP <BASE64(PAYLOAD)> LF
//! ```
//!
//! # Frame Types
//!
//! | Type | Direction | Payload |
//! |---|---|---|
//! | `H` | relay → client | greeting text, `squelch <mode>` |
//! | `A` | both | username (request and confirmation) |
//! | `M` | both | routed envelope, `route \0 nonce \0 tag \0 ciphertext` |
//! | `E` | relay → client | human-readable reason |
//!
//! Any other type character decodes as [`FrameType::Unknown`] and is ignored
//! by consumers.
//!
//! # Design
//!
//! - Frames carry raw bytes. The relay routes `M` frames by their route
//!   prefix ([`RoutedPayload`]) without touching the envelope behind it.
//! - Decoding never allocates more than one line; readers enforce
//!   [`MAX_LINE_LEN`] before decoding.
//! - Format errors are [`ProtocolError`] values. They are never confused with
//!   authentication failures, which belong to the crypto layer.

#![forbid(unsafe_code)]

pub mod errors;
pub mod frame;
pub mod io;
pub mod payload;

pub use errors::{ProtocolError, Result};
pub use frame::{Frame, FrameType};
pub use io::{MAX_LINE_LEN, read_frame, write_frame};
pub use payload::RoutedPayload;
