//! Signaling registry implementation
//!
//! The central registry that owns all connection, queue, and room state and
//! routes signaling traffic between connections.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;

use crate::protocol::{ConnectionId, ServerEvent};

use super::config::{DeploymentProfile, MessageAddressing, RegistryConfig};
use super::entry::ConnectionEntry;
use super::error::RegistryError;
use super::queue::{MatchQueues, QueueEntry};
use super::room::{RoomId, SessionType};

/// Tables guarded by the registry lock
///
/// Queue entries, room memberships, and connection records move together in
/// single operations, so all three live under one lock.
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    queues: MatchQueues,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

/// Central registry for all live connections
///
/// Every public operation acquires the lock once and runs to completion
/// under it, so no two operations interleave over the shared tables. In
/// particular, two `find_match` calls for the same type can never both
/// observe an empty queue when a match was possible.
pub struct SignalingRegistry {
    inner: RwLock<RegistryInner>,

    /// Configuration
    config: RegistryConfig,

    /// Total successful pairings
    matches_made: AtomicU64,
}

impl SignalingRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                connections: HashMap::new(),
                queues: MatchQueues::new(&config.session_types),
                rooms: HashMap::new(),
            }),
            config,
            matches_made: AtomicU64::new(0),
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a new connection and allocate its id
    ///
    /// The record starts idle, with no queue entry and no room. Events
    /// pushed to the connection flow through `tx`.
    pub async fn register(&self, tx: UnboundedSender<ServerEvent>) -> ConnectionId {
        let id = ConnectionId::new();
        let mut inner = self.inner.write().await;
        inner.connections.insert(id, ConnectionEntry::new(id, tx));

        tracing::info!(
            conn = %id,
            total = inner.connections.len(),
            "Connection registered"
        );

        id
    }

    /// Remove a connection, unwinding its queue and room state first
    ///
    /// Idempotent: a second call for the same id is a no-op. Tolerates
    /// connections that were never queued or paired.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(&connection) {
            return;
        }

        Self::unwind(&mut inner, connection);
        inner.connections.remove(&connection);

        tracing::info!(
            conn = %connection,
            total = inner.connections.len(),
            "Connection removed"
        );
    }

    /// Pair the connection with a waiting partner, or enqueue it
    ///
    /// The most recently queued entry of the same session type is taken as
    /// the partner. On a pairing, both sides receive `match_found`; the
    /// requester is the initiator. With no partner waiting, the requester
    /// joins the queue and waits indefinitely until matched, skipped, or
    /// disconnected.
    pub async fn find_match(
        &self,
        connection: ConnectionId,
        type_name: &str,
        interest: Option<String>,
    ) -> Result<(), RegistryError> {
        if self.config.profile != DeploymentProfile::Matchmaking {
            return Err(RegistryError::ProfileMismatch("find_match"));
        }

        let mut inner = self.inner.write().await;

        let requester = inner
            .connections
            .get(&connection)
            .ok_or(RegistryError::UnknownConnection(connection))?;
        if requester.state.is_engaged() {
            return Err(RegistryError::AlreadyEngaged(connection));
        }

        let session_type = SessionType::new(type_name);
        if !inner.queues.has_type(&session_type) {
            return Err(RegistryError::UnknownSessionType(type_name.to_string()));
        }

        let partner = loop {
            match inner.queues.pop_waiting(&session_type) {
                Some(entry) if inner.connections.contains_key(&entry.connection) => {
                    break Some(entry.connection);
                }
                Some(_) => continue,
                None => break None,
            }
        };

        match partner {
            Some(partner) => {
                let room = RoomId::from_pair(connection, partner);
                inner
                    .rooms
                    .insert(room.clone(), HashSet::from([connection, partner]));

                if let Some(entry) = inner.connections.get_mut(&connection) {
                    entry.state.paired(room.clone(), session_type.clone());
                    entry.send(ServerEvent::MatchFound {
                        partner_id: partner,
                        initiator: true,
                    });
                }
                if let Some(entry) = inner.connections.get_mut(&partner) {
                    entry.state.paired(room.clone(), session_type.clone());
                    entry.send(ServerEvent::MatchFound {
                        partner_id: connection,
                        initiator: false,
                    });
                }

                self.matches_made.fetch_add(1, Ordering::Relaxed);

                tracing::info!(
                    conn = %connection,
                    partner = %partner,
                    room = %room,
                    session_type = %session_type,
                    "Matched"
                );
            }
            None => {
                inner.queues.enqueue(
                    &session_type,
                    QueueEntry {
                        connection,
                        interest: interest.clone(),
                    },
                );
                if let Some(entry) = inner.connections.get_mut(&connection) {
                    entry.state.enqueued(session_type.clone(), interest);
                }

                tracing::info!(
                    conn = %connection,
                    session_type = %session_type,
                    waiting = inner.queues.waiting(&session_type),
                    "Queued"
                );
            }
        }

        Ok(())
    }

    /// Add the connection to a client-named room
    ///
    /// Existing members are notified with `user_joined`; the joiner receives
    /// nothing. The room is created on first join.
    pub async fn join_room(
        &self,
        connection: ConnectionId,
        room_name: &str,
    ) -> Result<(), RegistryError> {
        if self.config.profile != DeploymentProfile::ExplicitRooms {
            return Err(RegistryError::ProfileMismatch("join_room"));
        }

        let mut inner = self.inner.write().await;

        let joiner = inner
            .connections
            .get(&connection)
            .ok_or(RegistryError::UnknownConnection(connection))?;
        if joiner.state.is_engaged() {
            return Err(RegistryError::AlreadyEngaged(connection));
        }

        let room = RoomId::new(room_name);
        let existing: Vec<ConnectionId> = inner
            .rooms
            .get(&room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default();

        for member in &existing {
            if let Some(entry) = inner.connections.get(member) {
                entry.send(ServerEvent::UserJoined {
                    connection_id: connection,
                });
            }
        }

        inner.rooms.entry(room.clone()).or_default().insert(connection);
        if let Some(entry) = inner.connections.get_mut(&connection) {
            entry.state.joined(room.clone());
        }

        tracing::info!(
            conn = %connection,
            room = %room,
            members = existing.len() + 1,
            "Joined room"
        );

        Ok(())
    }

    /// Leave the current session and queues, staying connected
    ///
    /// Remaining room members receive `partner_disconnected`. The client is
    /// expected to issue a fresh `find_match` afterwards; nothing is
    /// re-enqueued here.
    pub async fn skip(&self, connection: ConnectionId) {
        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(&connection) {
            return;
        }

        Self::unwind(&mut inner, connection);
        tracing::debug!(conn = %connection, "Skipped");
    }

    /// Deliver a pre-built event to `target`, dropping it if unknown
    ///
    /// Fire-and-forget: a missing target is logged and discarded rather than
    /// reported back to `from`.
    async fn relay(&self, from: ConnectionId, target: ConnectionId, event: ServerEvent) {
        let inner = self.inner.read().await;
        match inner.connections.get(&target) {
            Some(entry) => {
                entry.send(event);
            }
            None => {
                tracing::debug!(from = %from, target = %target, "relay to unknown target, dropping");
            }
        }
    }

    /// Forward an SDP offer to `target`, stamped with the caller's id
    pub async fn relay_offer(&self, from: ConnectionId, target: ConnectionId, sdp: Value) {
        self.relay(from, target, ServerEvent::offer(sdp, from)).await;
    }

    /// Forward an SDP answer to `target`, stamped with the responder's id
    pub async fn relay_answer(&self, from: ConnectionId, target: ConnectionId, sdp: Value) {
        self.relay(from, target, ServerEvent::answer(sdp, from)).await;
    }

    /// Forward a connectivity candidate to `target`, stamped with the sender's id
    pub async fn relay_ice_candidate(
        &self,
        from: ConnectionId,
        target: ConnectionId,
        candidate: Value,
    ) {
        self.relay(from, target, ServerEvent::ice_candidate(candidate, from))
            .await;
    }

    /// Deliver a chat message under the configured addressing mode
    ///
    /// Direct-target mode forwards to the connection named in `target`;
    /// room-broadcast mode forwards to every member of the named room
    /// except the sender. The sender id and timestamp are server-assigned.
    /// Messages whose fields don't match the active mode are dropped.
    pub async fn send_message(
        &self,
        from: ConnectionId,
        target: Option<ConnectionId>,
        room: Option<&str>,
        text: String,
    ) {
        match self.config.profile.message_addressing() {
            MessageAddressing::DirectTarget => {
                let Some(target) = target else {
                    tracing::debug!(from = %from, "send_message without target, dropping");
                    return;
                };
                self.relay(from, target, ServerEvent::receive_message(text, from))
                    .await;
            }
            MessageAddressing::RoomBroadcast => {
                let Some(room) = room else {
                    tracing::debug!(from = %from, "send_message without room, dropping");
                    return;
                };
                let room = RoomId::new(room);

                let inner = self.inner.read().await;
                let Some(members) = inner.rooms.get(&room) else {
                    tracing::debug!(from = %from, room = %room, "send_message to unknown room, dropping");
                    return;
                };

                let event = ServerEvent::receive_message(text, from);
                for member in members {
                    if *member == from {
                        continue;
                    }
                    if let Some(entry) = inner.connections.get(member) {
                        entry.send(event.clone());
                    }
                }
            }
        }
    }

    /// Send a direct error acknowledgment to a connection
    pub async fn send_error(&self, connection: ConnectionId, message: &str) {
        let inner = self.inner.read().await;
        if let Some(entry) = inner.connections.get(&connection) {
            entry.send(ServerEvent::error(message));
        }
    }

    /// Get total number of live connections
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Get a snapshot of registry-wide counters
    pub async fn stats(&self) -> RegistryStats {
        let inner = self.inner.read().await;
        RegistryStats {
            connections: inner.connections.len(),
            waiting: inner.queues.waiting_counts(),
            open_rooms: inner.rooms.len(),
            matches_made: self.matches_made.load(Ordering::Relaxed),
        }
    }

    /// Unwind queue and room state for a leaving connection
    ///
    /// Remaining room members are notified with `partner_disconnected`;
    /// their own room reference stays in place until they act. A room with
    /// no members left is dropped.
    fn unwind(inner: &mut RegistryInner, connection: ConnectionId) {
        let room = match inner.connections.get_mut(&connection) {
            Some(entry) => {
                let room = entry.state.current_room.clone();
                entry.state.reset();
                room
            }
            None => return,
        };

        inner.queues.remove_all(connection);

        if let Some(room) = room {
            let remaining: Vec<ConnectionId> = match inner.rooms.get_mut(&room) {
                Some(members) => {
                    members.remove(&connection);
                    members.iter().copied().collect()
                }
                None => Vec::new(),
            };

            for member in &remaining {
                if let Some(entry) = inner.connections.get(member) {
                    entry.send(ServerEvent::PartnerDisconnected);
                }
            }

            if remaining.is_empty() {
                inner.rooms.remove(&room);
            }

            tracing::debug!(
                conn = %connection,
                room = %room,
                remaining = remaining.len(),
                "Left room"
            );
        }
    }
}

impl Default for SignalingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry-wide counters
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Live connections
    pub connections: usize,
    /// Waiting entries per session type
    pub waiting: HashMap<SessionType, usize>,
    /// Rooms with at least one member
    pub open_rooms: usize,
    /// Total successful pairings since startup
    pub matches_made: u64,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;

    async fn connect(
        registry: &SignalingRegistry,
    ) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.register(tx).await;
        (id, rx)
    }

    fn recv(rx: &mut UnboundedReceiver<ServerEvent>) -> ServerEvent {
        rx.try_recv().expect("expected a pending event")
    }

    fn assert_no_event(rx: &mut UnboundedReceiver<ServerEvent>) {
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_second_requester_pops_the_first() {
        let registry = SignalingRegistry::new();
        let (a, mut a_rx) = connect(&registry).await;
        let (b, mut b_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        assert_no_event(&mut a_rx);

        registry.find_match(b, "video", None).await.unwrap();

        let ServerEvent::MatchFound {
            partner_id,
            initiator,
        } = recv(&mut b_rx)
        else {
            panic!("expected match_found for b");
        };
        assert_eq!(partner_id, a);
        assert!(initiator);

        let ServerEvent::MatchFound {
            partner_id,
            initiator,
        } = recv(&mut a_rx)
        else {
            panic!("expected match_found for a");
        };
        assert_eq!(partner_id, b);
        assert!(!initiator);

        let stats = registry.stats().await;
        assert_eq!(stats.waiting[&SessionType::new("video")], 0);
        assert_eq!(stats.open_rooms, 1);
        assert_eq!(stats.matches_made, 1);

        let inner = registry.inner.read().await;
        let room = RoomId::from_pair(a, b);
        assert_eq!(inner.rooms[&room].len(), 2);
        assert_eq!(inner.connections[&a].state.current_room, Some(room));
    }

    #[tokio::test]
    async fn test_most_recent_waiter_is_matched_first() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;
        let (b, _b_rx) = connect(&registry).await;
        let (c, mut c_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        registry.find_match(b, "video", None).await.unwrap();
        registry.find_match(c, "video", None).await.unwrap();

        let ServerEvent::MatchFound { partner_id, .. } = recv(&mut c_rx) else {
            panic!("expected match_found for c");
        };
        assert_eq!(partner_id, b);

        // The earlier waiter stays queued
        let stats = registry.stats().await;
        assert_eq!(stats.waiting[&SessionType::new("video")], 1);
        let inner = registry.inner.read().await;
        assert!(inner.queues.contains(a));
    }

    #[tokio::test]
    async fn test_no_match_across_session_types() {
        let registry = SignalingRegistry::new();
        let (a, mut a_rx) = connect(&registry).await;
        let (b, mut b_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        registry.find_match(b, "text", None).await.unwrap();

        assert_no_event(&mut a_rx);
        assert_no_event(&mut b_rx);

        let stats = registry.stats().await;
        assert_eq!(stats.waiting[&SessionType::new("video")], 1);
        assert_eq!(stats.waiting[&SessionType::new("text")], 1);
    }

    #[tokio::test]
    async fn test_unknown_session_type_rejected() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;

        let result = registry.find_match(a, "voice", None).await;
        assert!(matches!(
            result,
            Err(RegistryError::UnknownSessionType(_))
        ));
    }

    #[tokio::test]
    async fn test_find_match_while_engaged_is_a_no_op() {
        let registry = SignalingRegistry::new();
        let (a, mut a_rx) = connect(&registry).await;
        let (b, _b_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        registry.find_match(b, "video", None).await.unwrap();
        let _ = recv(&mut a_rx);

        let result = registry.find_match(a, "video", None).await;
        assert!(matches!(result, Err(RegistryError::AlreadyEngaged(_))));

        // State untouched: still paired, not queued
        let inner = registry.inner.read().await;
        assert!(inner.connections[&a].state.current_room.is_some());
        assert!(!inner.queues.contains(a));
    }

    #[tokio::test]
    async fn test_skip_notifies_partner_and_leaves_stale_reference() {
        let registry = SignalingRegistry::new();
        let (a, mut a_rx) = connect(&registry).await;
        let (b, mut b_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        registry.find_match(b, "video", None).await.unwrap();
        let _ = recv(&mut a_rx);
        let _ = recv(&mut b_rx);

        registry.skip(a).await;

        assert_eq!(recv(&mut b_rx), ServerEvent::PartnerDisconnected);
        assert_no_event(&mut a_rx);

        let inner = registry.inner.read().await;
        let a_state = &inner.connections[&a].state;
        assert!(a_state.current_room.is_none());
        assert!(a_state.current_type.is_none());
        assert!(!inner.queues.contains(a));

        // The partner's room reference stays until it acts itself
        let room = RoomId::from_pair(a, b);
        assert_eq!(inner.connections[&b].state.current_room, Some(room.clone()));
        assert_eq!(inner.rooms[&room].len(), 1);
    }

    #[tokio::test]
    async fn test_room_dropped_once_both_sides_leave() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;
        let (b, _b_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        registry.find_match(b, "video", None).await.unwrap();

        registry.skip(a).await;
        registry.skip(b).await;

        let stats = registry.stats().await;
        assert_eq!(stats.open_rooms, 0);
    }

    #[tokio::test]
    async fn test_skip_while_queued_allows_requeue() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        registry.skip(a).await;

        let inner = registry.inner.read().await;
        assert!(!inner.queues.contains(a));
        drop(inner);

        registry.find_match(a, "text", None).await.unwrap();
        let stats = registry.stats().await;
        assert_eq!(stats.waiting[&SessionType::new("text")], 1);
        assert_eq!(stats.waiting[&SessionType::new("video")], 0);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;
        let (b, mut b_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        registry.find_match(b, "video", None).await.unwrap();
        let _ = recv(&mut b_rx);

        registry.disconnect(a).await;
        registry.disconnect(a).await;

        assert_eq!(recv(&mut b_rx), ServerEvent::PartnerDisconnected);
        assert_no_event(&mut b_rx);
        assert_eq!(registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_of_idle_connection() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;

        registry.disconnect(a).await;
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_removes_queue_entry() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;
        let (b, mut b_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        registry.disconnect(a).await;

        // The departed waiter can no longer be matched
        registry.find_match(b, "video", None).await.unwrap();
        assert_no_event(&mut b_rx);
        let stats = registry.stats().await;
        assert_eq!(stats.waiting[&SessionType::new("video")], 1);
    }

    #[tokio::test]
    async fn test_offer_reaches_only_the_target() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;
        let (b, mut b_rx) = connect(&registry).await;
        let (_c, mut c_rx) = connect(&registry).await;

        let sdp = serde_json::json!({"type": "offer", "sdp": "v=0"});
        registry.relay_offer(a, b, sdp.clone()).await;

        assert_eq!(recv(&mut b_rx), ServerEvent::Offer { sdp, caller: a });
        assert_no_event(&mut c_rx);
    }

    #[tokio::test]
    async fn test_relay_to_unknown_target_is_dropped() {
        let registry = SignalingRegistry::new();
        let (a, mut a_rx) = connect(&registry).await;

        registry
            .relay_answer(a, ConnectionId::new(), serde_json::json!({}))
            .await;
        registry
            .relay_ice_candidate(a, ConnectionId::new(), serde_json::json!({}))
            .await;

        assert_no_event(&mut a_rx);
    }

    #[tokio::test]
    async fn test_send_message_direct() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;
        let (b, mut b_rx) = connect(&registry).await;

        registry.send_message(a, Some(b), None, "hi".into()).await;

        let ServerEvent::ReceiveMessage {
            text,
            sender,
            timestamp,
        } = recv(&mut b_rx)
        else {
            panic!("expected receive_message");
        };
        assert_eq!(text, "hi");
        assert_eq!(sender, a);
        assert!(chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_send_message_without_target_is_dropped() {
        let registry = SignalingRegistry::new();
        let (a, mut a_rx) = connect(&registry).await;

        registry.send_message(a, None, None, "hi".into()).await;
        assert_no_event(&mut a_rx);
    }

    #[tokio::test]
    async fn test_join_room_announces_to_existing_members() {
        let registry = SignalingRegistry::with_config(
            RegistryConfig::default().profile(DeploymentProfile::ExplicitRooms),
        );
        let (a, mut a_rx) = connect(&registry).await;
        let (b, mut b_rx) = connect(&registry).await;

        registry.join_room(a, "lobby").await.unwrap();
        assert_no_event(&mut a_rx);

        registry.join_room(b, "lobby").await.unwrap();
        assert_eq!(
            recv(&mut a_rx),
            ServerEvent::UserJoined { connection_id: b }
        );
        assert_no_event(&mut b_rx);
    }

    #[tokio::test]
    async fn test_send_message_broadcast_skips_the_sender() {
        let registry = SignalingRegistry::with_config(
            RegistryConfig::default().profile(DeploymentProfile::ExplicitRooms),
        );
        let (a, mut a_rx) = connect(&registry).await;
        let (b, mut b_rx) = connect(&registry).await;
        let (c, mut c_rx) = connect(&registry).await;

        registry.join_room(a, "lobby").await.unwrap();
        registry.join_room(b, "lobby").await.unwrap();
        registry.join_room(c, "lobby").await.unwrap();
        while a_rx.try_recv().is_ok() {}
        while b_rx.try_recv().is_ok() {}

        registry.send_message(c, None, Some("lobby"), "hello".into()).await;

        assert!(matches!(
            recv(&mut a_rx),
            ServerEvent::ReceiveMessage { sender, .. } if sender == c
        ));
        assert!(matches!(
            recv(&mut b_rx),
            ServerEvent::ReceiveMessage { sender, .. } if sender == c
        ));
        assert_no_event(&mut c_rx);
    }

    #[tokio::test]
    async fn test_room_member_disconnect_notifies_the_rest() {
        let registry = SignalingRegistry::with_config(
            RegistryConfig::default().profile(DeploymentProfile::ExplicitRooms),
        );
        let (a, mut a_rx) = connect(&registry).await;
        let (b, _b_rx) = connect(&registry).await;

        registry.join_room(a, "lobby").await.unwrap();
        registry.join_room(b, "lobby").await.unwrap();
        let _ = recv(&mut a_rx);

        registry.disconnect(b).await;
        assert_eq!(recv(&mut a_rx), ServerEvent::PartnerDisconnected);
    }

    #[tokio::test]
    async fn test_profile_gating() {
        let matchmaking = SignalingRegistry::new();
        let (a, _a_rx) = connect(&matchmaking).await;
        assert!(matches!(
            matchmaking.join_room(a, "lobby").await,
            Err(RegistryError::ProfileMismatch(_))
        ));

        let rooms = SignalingRegistry::with_config(
            RegistryConfig::default().profile(DeploymentProfile::ExplicitRooms),
        );
        let (b, _b_rx) = connect(&rooms).await;
        assert!(matches!(
            rooms.find_match(b, "video", None).await,
            Err(RegistryError::ProfileMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_find_match_pairs_everyone() {
        let registry = Arc::new(SignalingRegistry::new());
        let mut receivers = Vec::new();
        let mut handles = Vec::new();

        for _ in 0..8 {
            let (id, rx) = connect(&registry).await;
            receivers.push(rx);
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.find_match(id, "video", None).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = registry.stats().await;
        assert_eq!(stats.waiting[&SessionType::new("video")], 0);
        assert_eq!(stats.matches_made, 4);
        assert_eq!(stats.open_rooms, 4);

        // Everyone got exactly one match_found; exactly one initiator per pair
        let mut initiators = 0;
        for rx in &mut receivers {
            match recv(rx) {
                ServerEvent::MatchFound { initiator, .. } => {
                    if initiator {
                        initiators += 1;
                    }
                }
                other => panic!("unexpected event: {other:?}"),
            }
            assert_no_event(rx);
        }
        assert_eq!(initiators, 4);
    }

    #[tokio::test]
    async fn test_concurrent_find_match_odd_count_leaves_one_waiting() {
        let registry = Arc::new(SignalingRegistry::new());
        let mut handles = Vec::new();
        let mut receivers = Vec::new();

        for _ in 0..5 {
            let (id, rx) = connect(&registry).await;
            receivers.push(rx);
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.find_match(id, "text", None).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = registry.stats().await;
        assert_eq!(stats.waiting[&SessionType::new("text")], 1);
        assert_eq!(stats.matches_made, 2);
    }

    #[tokio::test]
    async fn test_never_queued_and_roomed_at_once() {
        let registry = SignalingRegistry::new();
        let (a, _a_rx) = connect(&registry).await;
        let (b, _b_rx) = connect(&registry).await;

        registry.find_match(a, "video", None).await.unwrap();
        {
            let inner = registry.inner.read().await;
            assert!(inner.queues.contains(a));
            assert!(inner.connections[&a].state.current_room.is_none());
        }

        registry.find_match(b, "video", None).await.unwrap();
        let inner = registry.inner.read().await;
        assert!(!inner.queues.contains(a));
        assert!(!inner.queues.contains(b));
        assert!(inner.connections[&a].state.current_room.is_some());
        assert!(inner.connections[&b].state.current_room.is_some());
    }
}
