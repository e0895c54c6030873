//! Client events.

/// What a frame from the relay meant to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Relay greeting.
    Greeting {
        /// Routing mode announced by the relay (`direct`, `radio-net`)
        mode: String,
    },

    /// Relay confirmed our username.
    Authenticated {
        /// Confirmed username
        username: String,
    },

    /// A message opened successfully.
    Message {
        /// Sender username or relay label
        from: String,
        /// Decrypted text (lossy UTF-8)
        text: String,
    },

    /// A well-formed envelope that failed to open: wrong secret, forged or
    /// corrupted.
    Rejected {
        /// Claimed sender
        from: String,
    },

    /// Relay reported an error.
    ServerError(String),

    /// Frame needs no action (unknown type, stray greeting).
    Ignored,
}
