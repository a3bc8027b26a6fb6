//! Registry error types
//!
//! The rejections of the protocol's error taxonomy: misuse and unknown
//! lookups are reported back to the originating connection as a direct
//! error acknowledgment and never crash the connection or the process.

use thiserror::Error;

use crate::protocol::ConnectionId;

/// Error type for registry operations
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// No queue is configured for the requested session type
    #[error("unknown session type: {0}")]
    UnknownSessionType(String),

    /// The connection is already queued or in a session
    #[error("connection {0} is already queued or in a session")]
    AlreadyEngaged(ConnectionId),

    /// The connection id has no backing record
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// The operation is not available under the active deployment profile
    #[error("{0} is not available under the active deployment profile")]
    ProfileMismatch(&'static str),
}
