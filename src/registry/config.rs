//! Registry configuration

use super::room::SessionType;

/// How rooms are formed in a deployment
///
/// The two profiles share the relay router and connection registry and
/// differ only in the room-forming path: matchmade pairings or explicit
/// client-named rooms. Exactly one is active per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentProfile {
    /// Queue-based pairing via `find_match`
    Matchmaking,
    /// Client-named rooms via `join_room`
    ExplicitRooms,
}

/// Addressing mode for `send_message`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAddressing {
    /// Deliver to the connection named in the message's `target` field
    DirectTarget,
    /// Deliver to every member of the named room except the sender
    RoomBroadcast,
}

impl DeploymentProfile {
    /// The addressing mode `send_message` uses under this profile
    pub fn message_addressing(self) -> MessageAddressing {
        match self {
            DeploymentProfile::Matchmaking => MessageAddressing::DirectTarget,
            DeploymentProfile::ExplicitRooms => MessageAddressing::RoomBroadcast,
        }
    }
}

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Session types with a matchmaking queue
    pub session_types: Vec<SessionType>,

    /// Active deployment profile
    pub profile: DeploymentProfile,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            session_types: vec![SessionType::new("video"), SessionType::new("text")],
            profile: DeploymentProfile::Matchmaking,
        }
    }
}

impl RegistryConfig {
    /// Replace the configured session types
    pub fn session_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.session_types = types.into_iter().map(SessionType::new).collect();
        self
    }

    /// Set the deployment profile
    pub fn profile(mut self, profile: DeploymentProfile) -> Self {
        self.profile = profile;
        self
    }
}
