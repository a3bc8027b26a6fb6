//! Per-connection driver
//!
//! Owns one client socket from accept to disconnect: WebSocket upgrade
//! (with origin enforcement and the liveness probe), a writer task draining
//! the connection's outbound event channel, and the read loop that parses
//! client events and dispatches them into the registry.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{header, StatusCode};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::error::Result;
use crate::protocol::{ClientEvent, ConnectionId, ServerEvent};
use crate::registry::SignalingRegistry;
use crate::server::config::ServerConfig;

/// Static payload for the liveness endpoint
const HEALTH_BODY: &str = r#"{"status":"ok","message":"Server is running"}"#;

/// One client connection, from accept to disconnect
pub struct Connection {
    socket: TcpStream,
    peer_addr: SocketAddr,
    config: ServerConfig,
    registry: Arc<SignalingRegistry>,
}

impl Connection {
    /// Create a driver for an accepted socket
    pub fn new(
        socket: TcpStream,
        peer_addr: SocketAddr,
        config: ServerConfig,
        registry: Arc<SignalingRegistry>,
    ) -> Self {
        Self {
            socket,
            peer_addr,
            config,
            registry,
        }
    }

    /// Drive the connection until the client goes away
    ///
    /// Registers with the registry after the upgrade and always unwinds
    /// through `disconnect` on the way out, so no queue entry or room
    /// membership can outlive the socket.
    pub async fn run(mut self) -> Result<()> {
        if self.serve_health_probe().await? {
            return Ok(());
        }

        let Connection {
            socket,
            peer_addr,
            config,
            registry,
        } = self;

        let callback = upgrade_callback(config.allowed_origin.clone(), peer_addr);
        let ws = match tokio_tungstenite::accept_hdr_async(socket, callback).await {
            Ok(ws) => ws,
            Err(e) => {
                tracing::debug!(peer = %peer_addr, error = %e, "WebSocket handshake failed");
                return Ok(());
            }
        };

        let (sink, mut stream) = ws.split();
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.register(tx).await;

        tracing::info!(conn = %id, peer = %peer_addr, "Client connected");

        let writer = tokio::spawn(write_events(sink, rx));

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ClientEvent>(text.as_str()) {
                        Ok(event) => dispatch(&registry, id, event).await,
                        Err(e) => {
                            tracing::debug!(conn = %id, error = %e, "Ignoring malformed event");
                        }
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(conn = %id, error = %e, "Connection error");
                    break;
                }
            }
        }

        registry.disconnect(id).await;
        // The registry dropped the sender; the writer drains and exits
        let _ = writer.await;

        tracing::info!(conn = %id, peer = %peer_addr, "Client disconnected");
        Ok(())
    }

    /// Answer `GET /api/health` without upgrading
    ///
    /// Peeks at the request line so the socket can still be handed to the
    /// WebSocket handshake untouched. Returns `true` if the probe was
    /// served and the connection is done.
    async fn serve_health_probe(&mut self) -> Result<bool> {
        let mut buf = [0u8; 32];
        let n = self.socket.peek(&mut buf).await?;
        if !buf[..n].starts_with(b"GET /api/health") {
            return Ok(false);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
            HEALTH_BODY.len(),
            HEALTH_BODY
        );
        self.socket.write_all(response.as_bytes()).await?;
        self.socket.shutdown().await?;

        tracing::debug!(peer = %self.peer_addr, "Served liveness probe");
        Ok(true)
    }
}

/// Handshake callback enforcing the allowed origin
///
/// Requests without an `Origin` header pass; non-browser clients don't
/// send one.
fn upgrade_callback(
    allowed_origin: Option<String>,
    peer_addr: SocketAddr,
) -> impl FnOnce(&Request, Response) -> std::result::Result<Response, ErrorResponse> {
    move |request, response| {
        if let (Some(allowed), Some(origin)) =
            (&allowed_origin, request.headers().get(header::ORIGIN))
        {
            if origin.as_bytes() != allowed.as_bytes() {
                tracing::warn!(peer = %peer_addr, origin = ?origin, "Origin not allowed");
                let mut rejection = ErrorResponse::new(Some("origin not allowed".to_string()));
                *rejection.status_mut() = StatusCode::FORBIDDEN;
                return Err(rejection);
            }
        }
        Ok(response)
    }
}

/// Writer task: drain the outbound channel into the socket
async fn write_events(
    mut sink: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode event");
                continue;
            }
        };
        if sink.send(Message::text(json)).await.is_err() {
            break;
        }
    }
}

/// Route one client event into the registry
///
/// Rejections are acknowledged back to the originating connection only;
/// nothing here can take down other connections or the process.
async fn dispatch(registry: &SignalingRegistry, id: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::FindMatch {
            session_type,
            interest,
        } => {
            if let Err(e) = registry.find_match(id, &session_type, interest).await {
                tracing::warn!(conn = %id, error = %e, "find_match rejected");
                registry.send_error(id, &e.to_string()).await;
            }
        }
        ClientEvent::JoinRoom { room } => {
            if let Err(e) = registry.join_room(id, &room).await {
                tracing::warn!(conn = %id, error = %e, "join_room rejected");
                registry.send_error(id, &e.to_string()).await;
            }
        }
        ClientEvent::Offer { target, sdp } => registry.relay_offer(id, target, sdp).await,
        ClientEvent::Answer { target, sdp } => registry.relay_answer(id, target, sdp).await,
        ClientEvent::IceCandidate { target, candidate } => {
            registry.relay_ice_candidate(id, target, candidate).await;
        }
        ClientEvent::SendMessage { target, room, text } => {
            registry.send_message(id, target, room.as_deref(), text).await;
        }
        ClientEvent::Skip => registry.skip(id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejected_request_gets_an_error_ack() {
        let registry = SignalingRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = registry.register(tx).await;

        dispatch(
            &registry,
            id,
            ClientEvent::FindMatch {
                session_type: "voice".into(),
                interest: None,
            },
        )
        .await;

        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerEvent::Error { .. }
        ));
    }

    #[tokio::test]
    async fn test_skip_event_routes_to_registry() {
        let registry = SignalingRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = registry.register(tx).await;

        registry.find_match(id, "video", None).await.unwrap();
        dispatch(&registry, id, ClientEvent::Skip).await;

        let stats = registry.stats().await;
        assert_eq!(stats.waiting.values().sum::<usize>(), 0);
    }
}
