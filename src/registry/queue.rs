//! Matchmaking queues
//!
//! One waiting pool per configured session type. Pop order is
//! last-in-first-out: the most recently queued entry is matched first.
//! A connection holds at most one entry across all queues at any time;
//! the registry enforces this through its precondition checks and the
//! unconditional removal on skip/disconnect.

use std::collections::HashMap;

use crate::protocol::ConnectionId;

use super::room::SessionType;

/// One connection waiting for a partner of a given session type
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// The waiting connection
    pub connection: ConnectionId,
    /// Interest tag; carried for future filtering, not matched on
    pub interest: Option<String>,
}

/// Waiting pools keyed by session type
///
/// Only the types configured at construction exist; looking up any other
/// type is an error surfaced by the registry, never a panic.
#[derive(Debug)]
pub struct MatchQueues {
    queues: HashMap<SessionType, Vec<QueueEntry>>,
}

impl MatchQueues {
    /// Create queues for the given session types
    pub fn new(session_types: &[SessionType]) -> Self {
        Self {
            queues: session_types
                .iter()
                .map(|ty| (ty.clone(), Vec::new()))
                .collect(),
        }
    }

    /// Whether a queue exists for this session type
    pub fn has_type(&self, session_type: &SessionType) -> bool {
        self.queues.contains_key(session_type)
    }

    /// Append a waiting entry to the type's queue
    pub fn enqueue(&mut self, session_type: &SessionType, entry: QueueEntry) {
        if let Some(queue) = self.queues.get_mut(session_type) {
            queue.push(entry);
        }
    }

    /// Pop the most recently queued entry for this type
    pub fn pop_waiting(&mut self, session_type: &SessionType) -> Option<QueueEntry> {
        self.queues.get_mut(session_type)?.pop()
    }

    /// Remove any entry for the connection from every queue
    ///
    /// Idempotent; used by skip and disconnect.
    pub fn remove_all(&mut self, connection: ConnectionId) {
        for queue in self.queues.values_mut() {
            queue.retain(|entry| entry.connection != connection);
        }
    }

    /// Whether the connection is waiting in any queue
    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.queues
            .values()
            .any(|queue| queue.iter().any(|entry| entry.connection == connection))
    }

    /// Number of entries waiting for this type
    pub fn waiting(&self, session_type: &SessionType) -> usize {
        self.queues.get(session_type).map_or(0, Vec::len)
    }

    /// Waiting counts per session type
    pub fn waiting_counts(&self) -> HashMap<SessionType, usize> {
        self.queues
            .iter()
            .map(|(ty, queue)| (ty.clone(), queue.len()))
            .collect()
    }
}
