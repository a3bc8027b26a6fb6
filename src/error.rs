//! Crate-level error type

use thiserror::Error;

use crate::registry::RegistryError;

/// Result alias used throughout the server
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Socket-level failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or framing failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Malformed JSON frame
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Registry rejection
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
