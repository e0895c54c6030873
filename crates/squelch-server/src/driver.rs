//! Relay driver.
//!
//! Pure relay logic: the handshake, routing policies and per-session label
//! tables. Takes [`RelayEvent`]s from a runtime and answers with
//! [`RelayAction`]s for the runtime to execute. No I/O, no clocks.
//!
//! Envelopes are opaque here. The driver only reads the route prefix of
//! message payloads and rewrites it on the way out.

use squelch_proto::{Frame, FrameType, ProtocolError, RoutedPayload};

use crate::{
    labels::DEFAULT_MAX_LABELS,
    registry::{ConnectionRegistry, SessionInfo},
    username::validate_username,
};

/// Default connection limit
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// How message frames are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingPolicy {
    /// Route names one recipient; receivers see the sender's username
    #[default]
    Direct,
    /// Every message goes to every other authenticated session; receivers
    /// see a per-receiver `#N` label instead of the sender's name
    RadioNet,
}

impl RoutingPolicy {
    /// Mode name announced in the greeting.
    pub fn mode(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::RadioNet => "radio-net",
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Message routing policy
    pub policy: RoutingPolicy,
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// Senders remembered per receiver in radio-net mode
    pub max_labels: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            policy: RoutingPolicy::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_labels: DEFAULT_MAX_LABELS,
        }
    }
}

/// Events that the relay driver processes.
///
/// These are produced by the runtime.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// A new connection was accepted
    ConnectionAccepted {
        /// Unique connection ID assigned by the runtime
        session_id: u64,
    },

    /// A frame was received from a connection
    FrameReceived {
        /// Connection that sent the frame
        session_id: u64,
        /// The received frame
        frame: Frame,
    },

    /// A line from a connection failed to read or decode
    FrameRejected {
        /// Connection that sent the line
        session_id: u64,
        /// Why the line was rejected
        error: ProtocolError,
    },

    /// A connection was closed (by peer or error)
    ConnectionClosed {
        /// Connection that was closed
        session_id: u64,
        /// Reason for closure
        reason: String,
    },
}

/// Actions that the relay driver produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayAction {
    /// Send a frame to a specific session
    SendToSession {
        /// Target session ID
        session_id: u64,
        /// Frame to send
        frame: Frame,
    },

    /// Close a connection after flushing frames already queued for it
    CloseConnection {
        /// Session to close
        session_id: u64,
        /// Reason for closure
        reason: String,
    },

    /// Log a message
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
    },
}

/// Log levels for relay actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Action-based relay driver.
#[derive(Debug)]
pub struct RelayDriver {
    registry: ConnectionRegistry,
    config: DriverConfig,
}

impl RelayDriver {
    /// Create a new relay driver.
    pub fn new(config: DriverConfig) -> Self {
        Self { registry: ConnectionRegistry::new(), config }
    }

    /// Process a relay event and return actions to execute.
    pub fn process_event(&mut self, event: RelayEvent) -> Vec<RelayAction> {
        match event {
            RelayEvent::ConnectionAccepted { session_id } => {
                self.handle_connection_accepted(session_id)
            },
            RelayEvent::FrameReceived { session_id, frame } => {
                self.handle_frame_received(session_id, frame)
            },
            RelayEvent::FrameRejected { session_id, error } => {
                self.handle_frame_rejected(session_id, &error)
            },
            RelayEvent::ConnectionClosed { session_id, reason } => {
                self.handle_connection_closed(session_id, &reason)
            },
        }
    }

    /// Number of live sessions.
    pub fn connection_count(&self) -> usize {
        self.registry.session_count()
    }

    /// Session registry (read-only).
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Active configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn handle_connection_accepted(&mut self, session_id: u64) -> Vec<RelayAction> {
        if self.registry.session_count() >= self.config.max_connections {
            return vec![
                send(session_id, Frame::error("server full")),
                RelayAction::CloseConnection {
                    session_id,
                    reason: "max connections exceeded".to_string(),
                },
                log(LogLevel::Warn, format!("connection {session_id} refused: server full")),
            ];
        }

        if !self.registry.register_session(session_id, SessionInfo::new(self.config.max_labels)) {
            return vec![log(LogLevel::Error, format!("session {session_id} already registered"))];
        }

        vec![
            send(session_id, Frame::hello(self.config.policy.mode())),
            log(LogLevel::Debug, format!("connection {session_id} accepted")),
        ]
    }

    fn handle_frame_received(&mut self, session_id: u64, frame: Frame) -> Vec<RelayAction> {
        if !self.registry.has_session(session_id) {
            return vec![log(LogLevel::Warn, format!("frame from unknown session {session_id}"))];
        }

        if frame.version != Frame::CURRENT_VERSION {
            return reject(session_id, &format!("unsupported version {}", frame.version));
        }

        match frame.frame_type {
            FrameType::Auth => self.handle_auth(session_id, &frame),
            FrameType::Message => self.handle_message(session_id, &frame),
            FrameType::Hello | FrameType::Error | FrameType::Unknown(_) => vec![log(
                LogLevel::Debug,
                format!("ignoring {:?} frame from session {session_id}", frame.frame_type),
            )],
        }
    }

    fn handle_auth(&mut self, session_id: u64, frame: &Frame) -> Vec<RelayAction> {
        if self.registry.username(session_id).is_some() {
            return reject(session_id, "already authenticated");
        }

        let username = match frame.payload_text() {
            Ok(name) => name,
            Err(e) => return reject(session_id, &format!("malformed frame: {e}")),
        };

        if let Err(e) = validate_username(username) {
            return reject(session_id, &e.to_string());
        }

        if !self.registry.authenticate(session_id, username) {
            return reject(session_id, "username taken");
        }

        vec![
            send(session_id, Frame::auth(username)),
            log(LogLevel::Info, format!("session {session_id} authenticated as {username}")),
        ]
    }

    fn handle_message(&mut self, session_id: u64, frame: &Frame) -> Vec<RelayAction> {
        let Some(sender) = self.registry.username(session_id).map(str::to_owned) else {
            return reject(session_id, "not authenticated");
        };

        let routed = match RoutedPayload::parse(&frame.payload) {
            Ok(routed) => routed,
            Err(e) => return reject(session_id, &format!("malformed frame: {e}")),
        };

        match self.config.policy {
            RoutingPolicy::Direct => self.route_direct(session_id, &sender, &routed),
            RoutingPolicy::RadioNet => self.route_radio_net(session_id, &routed),
        }
    }

    fn route_direct(
        &self,
        session_id: u64,
        sender: &str,
        routed: &RoutedPayload,
    ) -> Vec<RelayAction> {
        if routed.route.is_empty() {
            return reject(session_id, "recipient required");
        }

        let Some(recipient) = self.registry.session_for_username(&routed.route) else {
            return reject(session_id, "unknown recipient");
        };

        let frame = Frame::message(routed.with_route(sender).encode());

        vec![
            send(recipient, frame),
            log(LogLevel::Debug, format!("session {session_id} -> session {recipient}")),
        ]
    }

    fn route_radio_net(&mut self, session_id: u64, routed: &RoutedPayload) -> Vec<RelayAction> {
        let receivers: Vec<u64> = self
            .registry
            .authenticated_sessions()
            .into_iter()
            .filter(|&id| id != session_id)
            .collect();

        let mut actions = Vec::with_capacity(receivers.len() + 1);

        for receiver in &receivers {
            let Some(info) = self.registry.session_mut(*receiver) else {
                continue;
            };
            let label = info.labels.label_for(session_id);
            actions.push(send(*receiver, Frame::message(routed.with_route(label).encode())));
        }

        actions.push(log(
            LogLevel::Debug,
            format!("session {session_id} broadcast to {} sessions", receivers.len()),
        ));
        actions
    }

    fn handle_frame_rejected(&self, session_id: u64, error: &ProtocolError) -> Vec<RelayAction> {
        match error {
            ProtocolError::LineTooLong { .. } => vec![
                send(session_id, Frame::error(&error.to_string())),
                RelayAction::CloseConnection { session_id, reason: error.to_string() },
                log(LogLevel::Warn, format!("session {session_id}: {error}")),
            ],
            ProtocolError::Io(_) => vec![RelayAction::CloseConnection {
                session_id,
                reason: error.to_string(),
            }],
            _ => reject(session_id, &format!("malformed frame: {error}")),
        }
    }

    fn handle_connection_closed(&mut self, session_id: u64, reason: &str) -> Vec<RelayAction> {
        match self.registry.unregister_session(session_id) {
            Some(info) => {
                let who = info.username.as_deref().unwrap_or("unauthenticated");
                vec![log(LogLevel::Info, format!("connection {session_id} ({who}) closed: {reason}"))]
            },
            None => Vec::new(),
        }
    }
}

fn send(session_id: u64, frame: Frame) -> RelayAction {
    RelayAction::SendToSession { session_id, frame }
}

fn log(level: LogLevel, message: String) -> RelayAction {
    RelayAction::Log { level, message }
}

fn reject(session_id: u64, reason: &str) -> Vec<RelayAction> {
    vec![
        send(session_id, Frame::error(reason)),
        log(LogLevel::Warn, format!("session {session_id}: {reason}")),
    ]
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn driver(policy: RoutingPolicy) -> RelayDriver {
        RelayDriver::new(DriverConfig { policy, ..Default::default() })
    }

    fn connect(driver: &mut RelayDriver, session_id: u64, name: &str) {
        driver.process_event(RelayEvent::ConnectionAccepted { session_id });
        let actions = driver.process_event(RelayEvent::FrameReceived {
            session_id,
            frame: Frame::auth(name),
        });
        assert_eq!(actions[0], send(session_id, Frame::auth(name)));
    }

    fn message(route: &str, body: &'static [u8]) -> Frame {
        let routed = RoutedPayload { route: route.to_string(), body: Bytes::from_static(body) };
        Frame::message(routed.encode())
    }

    fn sent_frames(actions: &[RelayAction]) -> Vec<(u64, &Frame)> {
        actions
            .iter()
            .filter_map(|a| match a {
                RelayAction::SendToSession { session_id, frame } => Some((*session_id, frame)),
                _ => None,
            })
            .collect()
    }

    fn error_text(frame: &Frame) -> &str {
        assert_eq!(frame.frame_type, FrameType::Error);
        frame.payload_text().unwrap()
    }

    #[test]
    fn greets_new_connection() {
        let mut driver = driver(RoutingPolicy::Direct);
        let actions = driver.process_event(RelayEvent::ConnectionAccepted { session_id: 1 });

        assert_eq!(actions[0], send(1, Frame::hello("direct")));
        assert_eq!(driver.connection_count(), 1);
    }

    #[test]
    fn radio_net_greeting_names_mode() {
        let mut driver = driver(RoutingPolicy::RadioNet);
        let actions = driver.process_event(RelayEvent::ConnectionAccepted { session_id: 1 });

        assert_eq!(actions[0], send(1, Frame::hello("radio-net")));
    }

    #[test]
    fn rejects_when_max_connections_exceeded() {
        let config = DriverConfig { max_connections: 2, ..Default::default() };
        let mut driver = RelayDriver::new(config);

        driver.process_event(RelayEvent::ConnectionAccepted { session_id: 1 });
        driver.process_event(RelayEvent::ConnectionAccepted { session_id: 2 });
        let actions = driver.process_event(RelayEvent::ConnectionAccepted { session_id: 3 });

        assert_eq!(driver.connection_count(), 2);
        assert_eq!(error_text(sent_frames(&actions)[0].1), "server full");
        assert!(matches!(actions[1], RelayAction::CloseConnection { session_id: 3, .. }));
    }

    #[test]
    fn invalid_username_is_refused() {
        let mut driver = driver(RoutingPolicy::Direct);
        driver.process_event(RelayEvent::ConnectionAccepted { session_id: 1 });

        let actions = driver
            .process_event(RelayEvent::FrameReceived { session_id: 1, frame: Frame::auth("-x") });

        assert_eq!(
            error_text(sent_frames(&actions)[0].1),
            "username must start with a letter or digit"
        );
        assert_eq!(driver.registry().username(1), None);
    }

    #[test]
    fn duplicate_username_is_refused() {
        let mut driver = driver(RoutingPolicy::Direct);
        connect(&mut driver, 1, "alice");
        driver.process_event(RelayEvent::ConnectionAccepted { session_id: 2 });

        let actions = driver.process_event(RelayEvent::FrameReceived {
            session_id: 2,
            frame: Frame::auth("alice"),
        });

        assert_eq!(error_text(sent_frames(&actions)[0].1), "username taken");
    }

    #[test]
    fn second_auth_is_refused() {
        let mut driver = driver(RoutingPolicy::Direct);
        connect(&mut driver, 1, "alice");

        let actions = driver
            .process_event(RelayEvent::FrameReceived { session_id: 1, frame: Frame::auth("bob") });

        assert_eq!(error_text(sent_frames(&actions)[0].1), "already authenticated");
        assert_eq!(driver.registry().username(1), Some("alice"));
    }

    #[test]
    fn message_before_auth_is_refused() {
        let mut driver = driver(RoutingPolicy::Direct);
        driver.process_event(RelayEvent::ConnectionAccepted { session_id: 1 });

        let actions = driver.process_event(RelayEvent::FrameReceived {
            session_id: 1,
            frame: message("bob", b"envelope"),
        });

        assert_eq!(error_text(sent_frames(&actions)[0].1), "not authenticated");
    }

    #[test]
    fn direct_message_is_delivered_with_sender_name() {
        let mut driver = driver(RoutingPolicy::Direct);
        connect(&mut driver, 1, "alice");
        connect(&mut driver, 2, "bob");

        let actions = driver.process_event(RelayEvent::FrameReceived {
            session_id: 1,
            frame: message("bob", b"n\0t\0c"),
        });

        let sent = sent_frames(&actions);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 2);
        assert_eq!(&sent[0].1.payload[..], b"alice\0n\0t\0c");
    }

    #[test]
    fn direct_requires_recipient() {
        let mut driver = driver(RoutingPolicy::Direct);
        connect(&mut driver, 1, "alice");

        let actions = driver
            .process_event(RelayEvent::FrameReceived { session_id: 1, frame: message("", b"x") });
        assert_eq!(error_text(sent_frames(&actions)[0].1), "recipient required");

        let actions = driver.process_event(RelayEvent::FrameReceived {
            session_id: 1,
            frame: message("nobody", b"x"),
        });
        assert_eq!(error_text(sent_frames(&actions)[0].1), "unknown recipient");
    }

    #[test]
    fn radio_net_broadcasts_with_labels() {
        let mut driver = driver(RoutingPolicy::RadioNet);
        connect(&mut driver, 1, "alice");
        connect(&mut driver, 2, "bob");
        connect(&mut driver, 3, "carol");

        let actions = driver
            .process_event(RelayEvent::FrameReceived { session_id: 3, frame: message("", b"x") });
        let sent = sent_frames(&actions);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, 1);
        assert_eq!(sent[1].0, 2);
        assert_eq!(&sent[0].1.payload[..], b"#1\0x");

        // Bob speaks next: alice has seen one sender already, so bob is #2
        let actions = driver
            .process_event(RelayEvent::FrameReceived { session_id: 2, frame: message("", b"y") });
        let sent = sent_frames(&actions);
        assert_eq!(sent[0].0, 1);
        assert_eq!(&sent[0].1.payload[..], b"#2\0y");
        assert_eq!(sent[1].0, 3);
        assert_eq!(&sent[1].1.payload[..], b"#1\0y");
    }

    #[test]
    fn radio_net_skips_unauthenticated_sessions() {
        let mut driver = driver(RoutingPolicy::RadioNet);
        connect(&mut driver, 1, "alice");
        driver.process_event(RelayEvent::ConnectionAccepted { session_id: 2 });

        let actions = driver
            .process_event(RelayEvent::FrameReceived { session_id: 1, frame: message("", b"x") });
        assert!(sent_frames(&actions).is_empty());
    }

    #[test]
    fn malformed_payload_keeps_connection_open() {
        let mut driver = driver(RoutingPolicy::Direct);
        connect(&mut driver, 1, "alice");

        let actions = driver.process_event(RelayEvent::FrameReceived {
            session_id: 1,
            frame: Frame::message(&b"no route"[..]),
        });

        assert!(error_text(sent_frames(&actions)[0].1).starts_with("malformed frame: "));
        assert!(!actions.iter().any(|a| matches!(a, RelayAction::CloseConnection { .. })));
    }

    #[test]
    fn rejected_line_reports_error() {
        let mut driver = driver(RoutingPolicy::Direct);
        driver.process_event(RelayEvent::ConnectionAccepted { session_id: 1 });

        let actions = driver.process_event(RelayEvent::FrameRejected {
            session_id: 1,
            error: ProtocolError::FieldCount { found: 2 },
        });
        assert!(error_text(sent_frames(&actions)[0].1).starts_with("malformed frame: "));
        assert!(!actions.iter().any(|a| matches!(a, RelayAction::CloseConnection { .. })));

        let actions = driver.process_event(RelayEvent::FrameRejected {
            session_id: 1,
            error: ProtocolError::LineTooLong { max: 65536 },
        });
        assert!(matches!(actions[1], RelayAction::CloseConnection { session_id: 1, .. }));
    }

    #[test]
    fn unknown_and_client_control_frames_are_ignored() {
        let mut driver = driver(RoutingPolicy::Direct);
        connect(&mut driver, 1, "alice");

        for frame_type in [FrameType::Hello, FrameType::Error, FrameType::Unknown('Z')] {
            let actions = driver.process_event(RelayEvent::FrameReceived {
                session_id: 1,
                frame: Frame::new(frame_type, Bytes::new()),
            });
            assert!(sent_frames(&actions).is_empty());
        }
    }

    #[test]
    fn unsupported_version_is_refused() {
        let mut driver = driver(RoutingPolicy::Direct);
        driver.process_event(RelayEvent::ConnectionAccepted { session_id: 1 });

        let mut frame = Frame::auth("alice");
        frame.version = 2;
        let actions = driver.process_event(RelayEvent::FrameReceived { session_id: 1, frame });

        assert_eq!(error_text(sent_frames(&actions)[0].1), "unsupported version 2");
        assert_eq!(driver.registry().username(1), None);
    }

    #[test]
    fn close_releases_username() {
        let mut driver = driver(RoutingPolicy::Direct);
        connect(&mut driver, 1, "alice");

        driver.process_event(RelayEvent::ConnectionClosed {
            session_id: 1,
            reason: "client disconnect".to_string(),
        });
        assert_eq!(driver.connection_count(), 0);

        connect(&mut driver, 2, "alice");
    }
}
