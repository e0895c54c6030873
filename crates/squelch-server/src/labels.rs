//! Per-receiver sender labels for radio-net routing.
//!
//! In radio-net mode receivers never learn sender usernames. Each receiving
//! session instead sees `#1`, `#2`, ... assigned in order of first contact.
//! The table is bounded; when full, the least recently used sender is
//! forgotten and gets a fresh number if it speaks again.

use std::collections::HashMap;

/// Default number of senders remembered per receiver
pub const DEFAULT_MAX_LABELS: usize = 64;

#[derive(Debug, Clone, Copy)]
struct Entry {
    number: u64,
    last_used: u64,
}

/// Bounded sender → label mapping owned by one receiving session.
///
/// # Invariants
///
/// - `entries.len() <= capacity`
/// - Label numbers are strictly increasing; a number is never handed out
///   twice, even after eviction
#[derive(Debug, Clone)]
pub struct PeerLabels {
    capacity: usize,
    next_number: u64,
    clock: u64,
    entries: HashMap<u64, Entry>,
}

impl PeerLabels {
    /// Create an empty table holding at most `capacity` senders.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), next_number: 1, clock: 0, entries: HashMap::new() }
    }

    /// Label for `sender`, assigning one if needed.
    pub fn label_for(&mut self, sender: u64) -> String {
        self.clock += 1;
        let now = self.clock;

        if let Some(entry) = self.entries.get_mut(&sender) {
            entry.last_used = now;
            return format_label(entry.number);
        }

        if self.entries.len() >= self.capacity {
            self.evict_least_recent();
        }

        let number = self.next_number;
        self.next_number += 1;
        self.entries.insert(sender, Entry { number, last_used: now });

        debug_assert!(self.entries.len() <= self.capacity);
        format_label(number)
    }

    /// Whether `sender` currently has a label.
    pub fn contains(&self, sender: u64) -> bool {
        self.entries.contains_key(&sender)
    }

    /// Number of remembered senders.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no sender is remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of remembered senders.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_least_recent(&mut self) {
        let oldest = self.entries.iter().min_by_key(|(_, entry)| entry.last_used).map(|(&id, _)| id);

        if let Some(id) = oldest {
            self.entries.remove(&id);
        }
    }
}

impl Default for PeerLabels {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LABELS)
    }
}

fn format_label(number: u64) -> String {
    format!("#{number}")
}
