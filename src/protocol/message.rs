//! Client and server event types
//!
//! Both directions use internally tagged JSON: `{"event": "...", ...fields}`.
//! Variant names are snake_case on the wire, field names camelCase. SDP and
//! ICE payloads are opaque to the server and pass through as raw JSON.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for a client connection
///
/// Stable for the connection's lifetime. Allocated server-side on register,
/// never client-supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a fresh connection id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Request a partner of the given session type
    FindMatch {
        #[serde(rename = "type")]
        session_type: String,
        /// Informational only; not used for filtering
        interest: Option<String>,
    },
    /// Join a client-named room (explicit-rooms profile)
    JoinRoom { room: String },
    /// Forward an SDP offer to `target`
    Offer { target: ConnectionId, sdp: Value },
    /// Forward an SDP answer to `target`
    Answer { target: ConnectionId, sdp: Value },
    /// Forward a connectivity candidate to `target`
    IceCandidate { target: ConnectionId, candidate: Value },
    /// Application chat message; addressing depends on the deployment profile
    SendMessage {
        target: Option<ConnectionId>,
        room: Option<String>,
        text: String,
    },
    /// Leave the current session and queues without disconnecting
    Skip,
}

/// Events pushed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// A pairing succeeded; exactly one side receives `initiator: true`
    MatchFound {
        partner_id: ConnectionId,
        initiator: bool,
    },
    /// Another connection joined the recipient's room
    UserJoined { connection_id: ConnectionId },
    /// Relayed SDP offer
    Offer { sdp: Value, caller: ConnectionId },
    /// Relayed SDP answer
    Answer { sdp: Value, responder: ConnectionId },
    /// Relayed connectivity candidate
    IceCandidate { candidate: Value, sender: ConnectionId },
    /// Relayed chat message with server-assigned sender and timestamp
    ReceiveMessage {
        text: String,
        sender: ConnectionId,
        timestamp: String,
    },
    /// The recipient's session partner left or disconnected
    PartnerDisconnected,
    /// Direct acknowledgment of a rejected request
    Error { message: String },
}

impl ServerEvent {
    /// Relayed offer, stamped with the sending connection
    pub fn offer(sdp: Value, caller: ConnectionId) -> Self {
        Self::Offer { sdp, caller }
    }

    /// Relayed answer, stamped with the sending connection
    pub fn answer(sdp: Value, responder: ConnectionId) -> Self {
        Self::Answer { sdp, responder }
    }

    /// Relayed candidate, stamped with the sending connection
    pub fn ice_candidate(candidate: Value, sender: ConnectionId) -> Self {
        Self::IceCandidate { candidate, sender }
    }

    /// Chat message with a server-generated RFC 3339 timestamp
    pub fn receive_message(text: String, sender: ConnectionId) -> Self {
        Self::ReceiveMessage {
            text,
            sender,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Error acknowledgment
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
