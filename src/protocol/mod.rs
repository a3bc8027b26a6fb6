//! Wire protocol for the signaling channel
//!
//! Messages are JSON text frames, tagged by an `event` field. Client events
//! arrive over the WebSocket and are dispatched into the registry; server
//! events are pushed out through each connection's outbound channel.

pub mod message;

pub use message::{ClientEvent, ConnectionId, ServerEvent};
