//! Route prefix of message payloads.
//!
//! An `M` payload is `route \0 body`. The relay reads and rewrites the route
//! and forwards `body` untouched.

use bytes::Bytes;

use crate::errors::{ProtocolError, Result};

/// Separator between the route and the body
pub const ROUTE_SEPARATOR: u8 = 0;

/// A message payload split at its first NUL byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedPayload {
    /// Recipient (client → relay) or sender label (relay → client)
    pub route: String,
    /// Everything after the first NUL, forwarded verbatim
    pub body: Bytes,
}

impl RoutedPayload {
    /// Split `payload` at its first NUL.
    ///
    /// # Errors
    ///
    /// - `MissingRoute` if the payload contains no NUL
    /// - `InvalidRoute` if the route is not UTF-8
    pub fn parse(payload: &Bytes) -> Result<Self> {
        let split = payload
            .iter()
            .position(|&b| b == ROUTE_SEPARATOR)
            .ok_or(ProtocolError::MissingRoute)?;

        let route = std::str::from_utf8(&payload[..split])
            .map_err(|_| ProtocolError::InvalidRoute)?
            .to_owned();

        Ok(Self { route, body: payload.slice(split + 1..) })
    }

    /// Same body, different route.
    #[must_use]
    pub fn with_route(&self, route: impl Into<String>) -> Self {
        Self { route: route.into(), body: self.body.clone() }
    }

    /// Join as `route \0 body`.
    pub fn encode(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.route.len() + 1 + self.body.len());
        out.extend_from_slice(self.route.as_bytes());
        out.push(ROUTE_SEPARATOR);
        out.extend_from_slice(&self.body);
        Bytes::from(out)
    }
}
