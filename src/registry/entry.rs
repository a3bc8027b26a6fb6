//! Per-connection registry record

use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::{ConnectionId, ServerEvent};
use crate::session::ConnectionState;

/// Registry record for one live connection
///
/// Owns the connection's outbound event channel. The receiving half is
/// drained by the connection's writer task; once that task is gone, sends
/// are dropped on the floor (relay is fire-and-forget).
#[derive(Debug)]
pub struct ConnectionEntry {
    /// Lifecycle state
    pub state: ConnectionState,

    /// Outbound event channel to the connection's writer task
    tx: UnboundedSender<ServerEvent>,
}

impl ConnectionEntry {
    /// Create a record for a newly registered connection
    pub(super) fn new(id: ConnectionId, tx: UnboundedSender<ServerEvent>) -> Self {
        Self {
            state: ConnectionState::new(id),
            tx,
        }
    }

    /// The connection's id
    pub fn id(&self) -> ConnectionId {
        self.state.id
    }

    /// Push an event to the connection
    ///
    /// Returns `false` if the writer task is gone; the event is dropped.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}
