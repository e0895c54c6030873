//! Fuzz target for the relay driver
//!
//! Drives a [`RelayDriver`] with arbitrary connection, auth and message
//! sequences across a handful of sessions under both routing policies.
//!
//! # Invariants
//!
//! - The driver NEVER panics
//! - Live sessions never exceed `max_connections`
//! - Message frames only reach authenticated sessions
//! - Usernames map to at most one session

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use squelch_proto::{Frame, FrameType, ProtocolError};
use squelch_server::{DriverConfig, RelayAction, RelayDriver, RelayEvent, RoutingPolicy};

const NAMES: [&str; 4] = ["alice", "bob", "carol", "-bad"];

#[derive(Debug, Arbitrary)]
struct Scenario {
    radio_net: bool,
    max_connections: u8,
    max_labels: u8,
    steps: Vec<Step>,
}

#[derive(Debug, Arbitrary)]
enum Step {
    Connect { session: u8 },
    Disconnect { session: u8 },
    Auth { session: u8, name: u8 },
    Message { session: u8, route: u8, body: Vec<u8> },
    Raw { session: u8, kind: u8, version: u32, payload: Vec<u8> },
    Reject { session: u8, fatal: bool },
}

fn session_id(session: u8) -> u64 {
    u64::from(session % 8)
}

fn name(index: u8) -> &'static str {
    NAMES[usize::from(index) % NAMES.len()]
}

fuzz_target!(|scenario: Scenario| {
    let max_connections = usize::from(scenario.max_connections % 6) + 1;
    let policy = if scenario.radio_net { RoutingPolicy::RadioNet } else { RoutingPolicy::Direct };
    let config = DriverConfig {
        policy,
        max_connections,
        max_labels: usize::from(scenario.max_labels % 4) + 1,
    };
    let mut driver = RelayDriver::new(config);

    for step in scenario.steps {
        let event = match step {
            Step::Connect { session } => {
                let id = session_id(session);
                if driver.registry().has_session(id) {
                    continue;
                }
                RelayEvent::ConnectionAccepted { session_id: id }
            },
            Step::Disconnect { session } => RelayEvent::ConnectionClosed {
                session_id: session_id(session),
                reason: "fuzz".to_string(),
            },
            Step::Auth { session, name: n } => RelayEvent::FrameReceived {
                session_id: session_id(session),
                frame: Frame::auth(name(n)),
            },
            Step::Message { session, route, body } => {
                let mut payload = name(route).as_bytes().to_vec();
                payload.push(0);
                payload.extend_from_slice(&body);
                RelayEvent::FrameReceived {
                    session_id: session_id(session),
                    frame: Frame::message(payload),
                }
            },
            Step::Raw { session, kind, version, payload } => {
                let frame_type = FrameType::from_char(char::from(kind));
                let mut frame = Frame::new(frame_type, Bytes::from(payload));
                frame.version = version;
                RelayEvent::FrameReceived { session_id: session_id(session), frame }
            },
            Step::Reject { session, fatal } => {
                let error = if fatal {
                    ProtocolError::LineTooLong { max: 1 }
                } else {
                    ProtocolError::InvalidUtf8
                };
                RelayEvent::FrameRejected { session_id: session_id(session), error }
            },
        };

        let actions = driver.process_event(event);

        for action in &actions {
            match action {
                RelayAction::SendToSession { session_id, frame } => {
                    if frame.frame_type == FrameType::Message {
                        let receiver = driver.registry().session(*session_id);
                        assert!(
                            receiver.is_some_and(|info| info.is_authenticated()),
                            "message sent to unauthenticated session {session_id}"
                        );
                    }
                },
                RelayAction::CloseConnection { .. } | RelayAction::Log { .. } => {},
            }
        }

        // The runtime reports every close back to the driver.
        for action in &actions {
            if let RelayAction::CloseConnection { session_id, reason } = action {
                driver.process_event(RelayEvent::ConnectionClosed {
                    session_id: *session_id,
                    reason: reason.clone(),
                });
            }
        }

        assert!(driver.connection_count() <= max_connections);

        let registry = driver.registry();
        for n in NAMES {
            if let Some(id) = registry.session_for_username(n) {
                assert_eq!(registry.username(id), Some(n));
            }
        }
    }
});
