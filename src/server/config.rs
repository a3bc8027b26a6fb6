//! Server configuration

use std::net::SocketAddr;

use crate::registry::RegistryConfig;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Origin allowed to open connections (None = any origin)
    ///
    /// Requests without an `Origin` header are always accepted; non-browser
    /// clients don't send one.
    pub allowed_origin: Option<String>,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Registry configuration
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".parse().unwrap(),
            allowed_origin: Some("http://localhost:5173".to_string()),
            max_connections: 0, // Unlimited
            tcp_nodelay: true,
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Build a config from the environment
    ///
    /// Reads `PORT` (default 3001) and `FRONTEND_URL` (default
    /// `http://localhost:5173`).
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(3001);
        let origin = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            allowed_origin: Some(origin),
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the allowed origin
    pub fn allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = Some(origin.into());
        self
    }

    /// Accept connections from any origin
    pub fn any_origin(mut self) -> Self {
        self.allowed_origin = None;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the registry configuration
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DeploymentProfile;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(
            config.allowed_origin.as_deref(),
            Some("http://localhost:5173")
        );
        assert_eq!(config.max_connections, 0);
        assert!(config.tcp_nodelay);
        assert_eq!(config.registry.profile, DeploymentProfile::Matchmaking);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 4000);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .allowed_origin("https://example.com")
            .max_connections(50)
            .registry(RegistryConfig::default().profile(DeploymentProfile::ExplicitRooms));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(
            config.allowed_origin.as_deref(),
            Some("https://example.com")
        );
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.registry.profile, DeploymentProfile::ExplicitRooms);
    }

    #[test]
    fn test_any_origin() {
        let config = ServerConfig::default().any_origin();
        assert!(config.allowed_origin.is_none());
    }
}
