//! Server configuration.

use crate::cors::CorsConfig;

/// Default limit on the size of a request body.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Where and how the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Path of the GraphQL endpoint.
    pub path: String,
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    /// Creates a config listening on `0.0.0.0:8080` with the endpoint at
    /// `/query`.
    pub fn new() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            path: "/query".to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            cors: CorsConfig::permissive(),
        }
    }

    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the endpoint path. A missing leading `/` is added.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    #[must_use]
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    /// `host:port`, with IPv6 hosts bracketed.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.path, "/query");
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert_eq!(config.cors, CorsConfig::permissive());
    }

    #[test]
    fn test_builders() {
        let config = ServerConfig::new().host("::1").port(4000).path("graphql");
        assert_eq!(config.address(), "[::1]:4000");
        assert_eq!(config.path, "/graphql");
    }
}
