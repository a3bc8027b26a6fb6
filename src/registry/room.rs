//! Room and session-type value types
//!
//! Keys for the registry's room membership map and matchmaking queues.

use serde::{Deserialize, Serialize};

use crate::protocol::ConnectionId;

/// Unique identifier for a room
///
/// Matchmade rooms derive their id from the two participant ids via
/// [`RoomId::from_pair`]; explicit rooms carry the client-chosen name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// Room id from a client-chosen name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Deterministic room id for a matchmade pairing
    ///
    /// The participant ids are joined in lexical order, so both sides of a
    /// pairing derive the same id regardless of who triggered the match.
    pub fn from_pair(a: ConnectionId, b: ConnectionId) -> Self {
        let (first, second) = (a.to_string(), b.to_string());
        if first <= second {
            Self(format!("{first}#{second}"))
        } else {
            Self(format!("{second}#{first}"))
        }
    }

    /// The room id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session-type tag naming a matchmaking queue (e.g. "video", "text")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionType(String);

impl SessionType {
    /// Create a session type from its name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The type name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
