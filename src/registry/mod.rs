//! Connection registry, matchmaking queues, rooms, and relay routing
//!
//! The registry is the single owner of all session state. Connection event
//! handlers call into it; nothing mutates queues or rooms from anywhere
//! else.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<SignalingRegistry>
//!                 ┌─────────────────────────────────┐
//!                 │ connections: HashMap<Id, Entry> │
//!                 │ queues: MatchQueues (per type)  │
//!                 │ rooms: HashMap<RoomId, members> │
//!                 └───────────────┬─────────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Connection]            [Connection]            [Connection]
//!    find_match/skip         offer/answer/ice        send_message
//!         │                       │                       │
//!         └──► entry.send() ──► mpsc channel ──► writer task ──► WebSocket
//! ```
//!
//! Each operation runs atomically under the registry lock, which is what
//! keeps a pair of simultaneous `find_match` calls from both seeing an
//! empty queue. Delivery is fire-and-forget: events are pushed into the
//! target connection's unbounded channel and drained by its writer task.

pub mod config;
pub mod entry;
pub mod error;
pub mod queue;
pub mod room;
pub mod store;

pub use config::{DeploymentProfile, MessageAddressing, RegistryConfig};
pub use entry::ConnectionEntry;
pub use error::RegistryError;
pub use queue::{MatchQueues, QueueEntry};
pub use room::{RoomId, SessionType};
pub use store::{RegistryStats, SignalingRegistry};
