//! Server configuration.

use crate::error::{ServerError, ServerResult};
use chrono::Duration;
use moonlight_core::{default_token_ttl, AppConfig, DEFAULT_HOST, DEFAULT_PORT};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration as StdDuration;

/// Default time a request waits for a collection or registry lock.
pub const DEFAULT_LOCK_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Configuration for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Lifetime of tokens issued by `/auth`.
    pub token_ttl: Duration,
    /// Longest a request waits for a lock before failing with 409.
    pub lock_timeout: StdDuration,
}

impl ServerConfig {
    /// Creates a configuration bound to `bind_addr`.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            token_ttl: default_token_ttl(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Builds a configuration from the registry's host and port.
    pub fn from_app(app: &AppConfig) -> ServerResult<Self> {
        let ip: IpAddr = match app.host.as_str() {
            "localhost" => IpAddr::from([127, 0, 0, 1]),
            host => host
                .parse()
                .map_err(|e| ServerError::Config(format!("invalid host `{host}`: {e}")))?,
        };
        Ok(Self::new(SocketAddr::new(ip, app.port)))
    }

    /// Sets the token lifetime.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Sets the lock timeout.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: StdDuration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let ip = DEFAULT_HOST
            .parse()
            .unwrap_or(IpAddr::from([127, 0, 0, 1]));
        Self::new(SocketAddr::new(ip, DEFAULT_PORT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.token_ttl, Duration::hours(3));
        assert_eq!(config.lock_timeout, DEFAULT_LOCK_TIMEOUT);
    }

    #[test]
    fn from_registry() {
        let app = AppConfig {
            host: "0.0.0.0".into(),
            port: 9000,
            ..AppConfig::default()
        };
        let config = ServerConfig::from_app(&app)
            .unwrap()
            .with_token_ttl(Duration::minutes(5));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.token_ttl, Duration::minutes(5));

        let app = AppConfig {
            host: "moon.local".into(),
            ..AppConfig::default()
        };
        assert!(matches!(
            ServerConfig::from_app(&app),
            Err(ServerError::Config(_))
        ));
    }
}
