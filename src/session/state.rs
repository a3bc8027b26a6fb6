//! Connection state machine
//!
//! Tracks one connection's progress through the matchmaking lifecycle:
//! `Idle -> Queued -> Paired -> Idle`, or `Idle -> RoomMember -> Idle` under
//! the explicit-rooms profile. All mutation happens inside the registry's
//! lock, so transitions never race.

use std::time::Instant;

use crate::protocol::ConnectionId;
use crate::registry::room::{RoomId, SessionType};

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Connected, not queued and not in a session
    Idle,
    /// Waiting in a matchmaking queue
    Queued,
    /// Paired into a matchmade session
    Paired,
    /// Member of an explicitly joined room
    RoomMember,
}

/// Session-relevant state for one connection
#[derive(Debug, Clone)]
pub struct ConnectionState {
    /// Unique connection id
    pub id: ConnectionId,

    /// Current phase
    pub phase: ConnectionPhase,

    /// Room the connection currently belongs to
    pub current_room: Option<RoomId>,

    /// Session type set when queued or paired
    pub current_type: Option<SessionType>,

    /// Interest tag from the last `find_match`; informational only
    pub interest: Option<String>,

    /// Connection start time
    pub connected_at: Instant,
}

impl ConnectionState {
    /// Create a fresh idle state
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            phase: ConnectionPhase::Idle,
            current_room: None,
            current_type: None,
            interest: None,
            connected_at: Instant::now(),
        }
    }

    /// Whether the connection is queued or in a session
    ///
    /// Used as the precondition check for `find_match` and `join_room`.
    pub fn is_engaged(&self) -> bool {
        self.phase != ConnectionPhase::Idle
    }

    /// Transition to waiting in a queue
    pub fn enqueued(&mut self, session_type: SessionType, interest: Option<String>) {
        if self.phase == ConnectionPhase::Idle {
            self.phase = ConnectionPhase::Queued;
            self.current_type = Some(session_type);
            self.interest = interest;
        }
    }

    /// Transition into a matchmade session
    ///
    /// Valid from `Idle` (the requester that triggered the match) and from
    /// `Queued` (the waiting side that got popped).
    pub fn paired(&mut self, room: RoomId, session_type: SessionType) {
        if matches!(self.phase, ConnectionPhase::Idle | ConnectionPhase::Queued) {
            self.phase = ConnectionPhase::Paired;
            self.current_room = Some(room);
            self.current_type = Some(session_type);
        }
    }

    /// Transition into an explicitly joined room
    pub fn joined(&mut self, room: RoomId) {
        if self.phase == ConnectionPhase::Idle {
            self.phase = ConnectionPhase::RoomMember;
            self.current_room = Some(room);
        }
    }

    /// Return to idle, clearing room, type, and interest
    ///
    /// Idempotent; runs on skip and on disconnect.
    pub fn reset(&mut self) {
        self.phase = ConnectionPhase::Idle;
        self.current_room = None;
        self.current_type = None;
        self.interest = None;
    }

    /// Time since the connection registered
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
