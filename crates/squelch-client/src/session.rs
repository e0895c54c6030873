//! Sans-IO client session.
//!
//! Turns user text into sealed message frames and relay frames into
//! [`ClientEvent`]s. Holds the shared secret for the lifetime of the session;
//! performs no I/O.

use squelch_crypto::{Envelope, open, seal};
use squelch_proto::{Frame, FrameType};
use zeroize::Zeroizing;

use crate::{ClientError, ClientEvent};

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, greeting not yet seen
    Connecting,
    /// Auth frame sent, waiting for confirmation
    AwaitingAuth,
    /// Relay confirmed the username
    Authenticated,
}

/// One client's view of a relay connection.
pub struct ClientSession {
    secret: Zeroizing<Vec<u8>>,
    username: String,
    recipient: String,
    mode: Option<String>,
    state: SessionState,
}

impl ClientSession {
    /// Create a session that authenticates as `username` and addresses
    /// messages to `recipient` (empty for radio-net relays).
    pub fn new(secret: Zeroizing<Vec<u8>>, username: &str, recipient: Option<&str>) -> Self {
        Self {
            secret,
            username: username.to_owned(),
            recipient: recipient.unwrap_or_default().to_owned(),
            mode: None,
            state: SessionState::Connecting,
        }
    }

    /// Frame requesting our username.
    pub fn auth_frame(&mut self) -> Frame {
        self.state = SessionState::AwaitingAuth;
        Frame::auth(&self.username)
    }

    /// Seal `text` into a message frame for the configured recipient.
    ///
    /// # Errors
    ///
    /// - `Envelope` if the recipient contains a NUL byte
    pub fn compose(&self, text: &str) -> Result<Frame, ClientError> {
        let envelope = seal(&self.secret, text.as_bytes());
        let payload = envelope.encode_routed(&self.recipient)?;
        Ok(Frame::message(payload))
    }

    /// Interpret one frame from the relay.
    ///
    /// Envelopes that fail to open are reported as [`ClientEvent::Rejected`],
    /// not as errors.
    ///
    /// # Errors
    ///
    /// - `Envelope` if a message payload is not a routed envelope
    /// - `Protocol` if a control frame's payload is not UTF-8
    pub fn handle_frame(&mut self, frame: &Frame) -> Result<ClientEvent, ClientError> {
        match frame.frame_type {
            FrameType::Hello => {
                let text = frame.payload_text()?;
                let mode = text.strip_prefix("squelch ").unwrap_or(text).to_owned();
                self.mode = Some(mode.clone());
                Ok(ClientEvent::Greeting { mode })
            },
            FrameType::Auth => {
                let username = frame.payload_text()?.to_owned();
                self.state = SessionState::Authenticated;
                Ok(ClientEvent::Authenticated { username })
            },
            FrameType::Message => {
                let (from, envelope) = Envelope::decode_routed(&frame.payload)?;
                Ok(self.open_message(from, &envelope))
            },
            FrameType::Error => {
                Ok(ClientEvent::ServerError(String::from_utf8_lossy(&frame.payload).into_owned()))
            },
            FrameType::Unknown(_) => Ok(ClientEvent::Ignored),
        }
    }

    /// Handshake progress.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the relay has confirmed our username.
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Routing mode from the relay greeting, once seen.
    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    /// Our username.
    pub fn username(&self) -> &str {
        &self.username
    }

    fn open_message(&self, from: String, envelope: &Envelope) -> ClientEvent {
        match open(&self.secret, envelope) {
            Ok(plaintext) => {
                let text = String::from_utf8_lossy(&plaintext).into_owned();
                ClientEvent::Message { from, text }
            },
            Err(_) => ClientEvent::Rejected { from },
        }
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("username", &self.username)
            .field("recipient", &self.recipient)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use squelch_crypto::CryptoError;

    use super::*;

    fn session(secret: &[u8], name: &str, to: Option<&str>) -> ClientSession {
        ClientSession::new(Zeroizing::new(secret.to_vec()), name, to)
    }

    /// What the relay would deliver for `frame` sent by `sender`.
    fn relayed(frame: &Frame, sender: &str) -> Frame {
        let (_, envelope) = Envelope::decode_routed(&frame.payload).unwrap();
        Frame::message(envelope.encode_routed(sender).unwrap())
    }

    #[test]
    fn handshake_progression() {
        let mut alice = session(b"correct horse", "alice", Some("bob"));
        assert_eq!(alice.state(), SessionState::Connecting);

        let event = alice.handle_frame(&Frame::hello("direct")).unwrap();
        assert_eq!(event, ClientEvent::Greeting { mode: "direct".to_string() });
        assert_eq!(alice.mode(), Some("direct"));

        let auth = alice.auth_frame();
        assert_eq!(auth, Frame::auth("alice"));
        assert_eq!(alice.state(), SessionState::AwaitingAuth);

        let event = alice.handle_frame(&Frame::auth("alice")).unwrap();
        assert_eq!(event, ClientEvent::Authenticated { username: "alice".to_string() });
        assert!(alice.is_authenticated());
    }

    #[test]
    fn compose_addresses_recipient() {
        let alice = session(b"correct horse", "alice", Some("bob"));
        let frame = alice.compose("hello there").unwrap();

        assert_eq!(frame.frame_type, FrameType::Message);
        let (route, _) = Envelope::decode_routed(&frame.payload).unwrap();
        assert_eq!(route, "bob");
    }

    #[test]
    fn radio_net_compose_has_empty_route() {
        let alice = session(b"correct horse", "alice", None);
        let frame = alice.compose("hi").unwrap();

        let (route, _) = Envelope::decode_routed(&frame.payload).unwrap();
        assert!(route.is_empty());
    }

    #[test]
    fn message_opens_under_shared_secret() {
        let alice = session(b"correct horse", "alice", Some("bob"));
        let mut bob = session(b"correct horse", "bob", Some("alice"));

        let frame = relayed(&alice.compose("hello there").unwrap(), "alice");
        let event = bob.handle_frame(&frame).unwrap();

        assert_eq!(event, ClientEvent::Message {
            from: "alice".to_string(),
            text: "hello there".to_string(),
        });
    }

    #[test]
    fn wrong_secret_is_rejected_not_an_error() {
        let alice = session(b"correct horse", "alice", Some("bob"));
        let mut mallory = session(b"battery staple", "mallory", None);

        let frame = relayed(&alice.compose("hello there").unwrap(), "alice");
        let event = mallory.handle_frame(&frame).unwrap();

        assert_eq!(event, ClientEvent::Rejected { from: "alice".to_string() });
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let mut bob = session(b"correct horse", "bob", None);
        let result = bob.handle_frame(&Frame::message(&b"alice\0only-two"[..]));

        assert!(matches!(
            result,
            Err(ClientError::Envelope(CryptoError::MissingField { expected: 4, found: 2 }))
        ));
    }

    #[test]
    fn relay_errors_and_unknown_frames() {
        let mut bob = session(b"correct horse", "bob", None);

        let event = bob.handle_frame(&Frame::error("unknown recipient")).unwrap();
        assert_eq!(event, ClientEvent::ServerError("unknown recipient".to_string()));

        let event = bob.handle_frame(&Frame::new(FrameType::Unknown('P'), &b""[..])).unwrap();
        assert_eq!(event, ClientEvent::Ignored);
    }

    #[test]
    fn debug_hides_secret() {
        let bob = session(b"hunter2", "bob", None);
        assert!(!format!("{bob:?}").contains("hunter2"));
    }
}
