//! Error types for envelope cryptography.
//!
//! Two classes, kept apart on purpose:
//!
//! - [`CryptoError`]: format errors (wrong lengths, malformed envelope
//!   layout). Reported with full detail so the caller can decide what to do.
//! - [`NotAuthentic`]: anything that goes wrong while opening an envelope.
//!   Carries no cause at all.

use thiserror::Error;

/// Format errors raised by the block modes and the envelope codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Input to a raw block mode is not a whole number of blocks
    #[error("input length {len} is not a multiple of the {block}-byte block size")]
    UnalignedInput {
        /// Length of the rejected input
        len: usize,
        /// Block size of the cipher
        block: usize,
    },

    /// IV does not match the cipher block size
    #[error("invalid IV length: expected {expected} bytes, got {actual}")]
    InvalidIvLength {
        /// Required IV length
        expected: usize,
        /// Supplied IV length
        actual: usize,
    },

    /// Key does not match the cipher's declared key size
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required key length
        expected: usize,
        /// Supplied key length
        actual: usize,
    },

    /// Padding was malformed after decryption
    #[error("invalid padding")]
    Padding,

    /// Envelope payload has fewer fields than required
    #[error("missing envelope field: expected {expected} fields, found {found}")]
    MissingField {
        /// Number of NUL-separated fields required
        expected: usize,
        /// Number of fields present
        found: usize,
    },

    /// Envelope payload has more fields than allowed
    #[error("too many envelope fields: expected {expected}")]
    TooManyFields {
        /// Number of NUL-separated fields allowed
        expected: usize,
    },

    /// Envelope field is not valid UTF-8 text
    #[error("envelope field `{field}` is not valid UTF-8")]
    InvalidField {
        /// Name of the offending field
        field: &'static str,
    },

    /// Envelope field contains the NUL field separator
    #[error("envelope field `{field}` contains a NUL byte")]
    FieldContainsSeparator {
        /// Name of the offending field
        field: &'static str,
    },
}

/// An envelope failed to open.
///
/// Deliberately opaque: a forged tag, a wrong secret, a truncated nonce and a
/// corrupt padding block all produce this same value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("message is not authentic")]
pub struct NotAuthentic;
