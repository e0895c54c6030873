//! Connection registry for session and username tracking.
//!
//! The registry maintains bidirectional mappings: session → info (for
//! delivery and cleanup) and username → session (for direct routing). Both
//! directions are O(1). One session per username.

use std::collections::HashMap;

use crate::labels::PeerLabels;

/// Information about a registered session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Username, set once the session authenticates
    pub username: Option<String>,
    /// Labels this session sees for radio-net senders
    pub labels: PeerLabels,
}

impl SessionInfo {
    /// Create an unauthenticated session remembering up to `max_labels`
    /// senders.
    pub fn new(max_labels: usize) -> Self {
        Self { username: None, labels: PeerLabels::new(max_labels) }
    }

    /// Whether the session has completed the handshake.
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self { username: None, labels: PeerLabels::default() }
    }
}

/// Registry of live sessions.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Session ID → session info
    sessions: HashMap<u64, SessionInfo>,
    /// Username → session ID (reverse index). Enforces one session per name
    user_sessions: HashMap<String, u64>,
}

impl ConnectionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new unauthenticated session.
    ///
    /// Returns `false` if the session already exists.
    pub fn register_session(&mut self, session_id: u64, info: SessionInfo) -> bool {
        if self.sessions.contains_key(&session_id) {
            return false;
        }

        if let Some(name) = &info.username {
            if self.user_sessions.contains_key(name) {
                return false;
            }
            self.user_sessions.insert(name.clone(), session_id);
        }

        self.sessions.insert(session_id, info);
        true
    }

    /// Unregister a session, releasing its username.
    pub fn unregister_session(&mut self, session_id: u64) -> Option<SessionInfo> {
        let info = self.sessions.remove(&session_id)?;

        if let Some(name) = &info.username {
            self.user_sessions.remove(name);
        }

        Some(info)
    }

    /// Bind `username` to an unauthenticated session.
    ///
    /// Returns `false` if the session doesn't exist, is already
    /// authenticated, or the name belongs to another session.
    pub fn authenticate(&mut self, session_id: u64, username: &str) -> bool {
        if self.user_sessions.contains_key(username) {
            return false;
        }

        let Some(info) = self.sessions.get_mut(&session_id) else {
            return false;
        };
        if info.is_authenticated() {
            return false;
        }

        info.username = Some(username.to_owned());
        self.user_sessions.insert(username.to_owned(), session_id);
        true
    }

    /// Session metadata. `None` if session doesn't exist.
    pub fn session(&self, session_id: u64) -> Option<&SessionInfo> {
        self.sessions.get(&session_id)
    }

    /// Mutable session metadata. `None` if session doesn't exist.
    pub fn session_mut(&mut self, session_id: u64) -> Option<&mut SessionInfo> {
        self.sessions.get_mut(&session_id)
    }

    /// Check if a session is registered.
    pub fn has_session(&self, session_id: u64) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Username of an authenticated session.
    pub fn username(&self, session_id: u64) -> Option<&str> {
        self.sessions.get(&session_id).and_then(|info| info.username.as_deref())
    }

    /// Session currently holding `username`.
    pub fn session_for_username(&self, username: &str) -> Option<u64> {
        self.user_sessions.get(username).copied()
    }

    /// IDs of all authenticated sessions, in ascending order.
    pub fn authenticated_sessions(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.user_sessions.values().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Total number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of authenticated sessions.
    pub fn authenticated_count(&self) -> usize {
        self.user_sessions.len()
    }
}
