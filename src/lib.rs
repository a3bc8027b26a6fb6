//! WebRTC signaling and matchmaking relay server
//!
//! This crate brokers the handshake between peer-to-peer clients: it pairs
//! anonymous connections into sessions and relays their negotiation
//! messages (SDP offers/answers, ICE candidates) and chat messages. Media
//! never touches the server.
//!
//! # Protocol
//!
//! Clients connect over WebSocket and exchange JSON frames tagged by an
//! `event` field.
//!
//! Client → server:
//! - `{"event":"find_match","type":"video","interest":"..."}` - request a partner
//! - `{"event":"join_room","room":"lobby"}` - join a named room (explicit-rooms profile)
//! - `{"event":"offer","target":"<id>","sdp":...}` - forward an SDP offer
//! - `{"event":"answer","target":"<id>","sdp":...}` - forward an SDP answer
//! - `{"event":"ice_candidate","target":"<id>","candidate":...}` - forward a candidate
//! - `{"event":"send_message","target":"<id>","text":"hi"}` - chat message
//! - `{"event":"skip"}` - leave the current session and queues
//!
//! Server → client:
//! - `{"event":"match_found","partnerId":"<id>","initiator":true}` - paired; the
//!   initiator creates the offer
//! - `{"event":"user_joined","connectionId":"<id>"}` - someone joined your room
//! - `{"event":"offer","sdp":...,"caller":"<id>"}` - relayed offer
//! - `{"event":"answer","sdp":...,"responder":"<id>"}` - relayed answer
//! - `{"event":"ice_candidate","candidate":...,"sender":"<id>"}` - relayed candidate
//! - `{"event":"receive_message","text":"hi","sender":"<id>","timestamp":"..."}` - chat
//! - `{"event":"partner_disconnected"}` - your partner left
//! - `{"event":"error","message":"..."}` - a request was rejected
//!
//! `GET /api/health` on the same port answers a static liveness payload.
//!
//! # Example
//!
//! ```no_run
//! use rendezvous_rs::{ServerConfig, SignalingServer};
//!
//! #[tokio::main]
//! async fn main() -> rendezvous_rs::Result<()> {
//!     let server = SignalingServer::new(ServerConfig::from_env());
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use error::{Error, Result};
pub use protocol::{ClientEvent, ConnectionId, ServerEvent};
pub use registry::{
    DeploymentProfile, RegistryConfig, RegistryStats, RoomId, SessionType, SignalingRegistry,
};
pub use server::{ServerConfig, SignalingServer};
