//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the LoamDB server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Maximum accepted request size in bytes.
    pub max_request_bytes: usize,
}

impl ServerConfig {
    /// Creates a new server configuration.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_connections: 1000,
            request_timeout: Duration::from_secs(30),
            max_request_bytes: 1024 * 1024,
        }
    }

    /// Sets the maximum concurrent connections.
    #[must_use]
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum accepted request size.
    #[must_use]
    pub fn with_max_request_bytes(mut self, bytes: usize) -> Self {
        self.max_request_bytes = bytes;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(([127, 0, 0, 1], 7207).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 7207);
        assert_eq!(config.max_connections, 1000);
    }

    #[test]
    fn config_builders() {
        let config = ServerConfig::default()
            .with_max_connections(10)
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
