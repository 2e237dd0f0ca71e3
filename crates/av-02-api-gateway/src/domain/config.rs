//! Gateway configuration with validation.

use super::error::GatewayError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8086;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (default: 0.0.0.0)
    pub host: IpAddr,
    /// Bind port (default: 8086)
    pub port: u16,
    /// Largest upload body accepted, in bytes
    pub max_upload_size: usize,
    /// Largest `/api/auth` body accepted, in bytes
    pub max_auth_body: usize,
    /// How long in-flight requests may run after shutdown begins
    pub shutdown_grace: Duration,
    /// Peers allowed to supply `X-Forwarded-For`
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_size: 64 * 1024 * 1024,
            max_auth_body: 16 * 1024,
            shutdown_grace: Duration::from_secs(10),
            trusted_proxies: Vec::new(),
        }
    }
}

impl ApiConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.max_upload_size == 0 {
            return Err(GatewayError::Config("max_upload_size cannot be 0".into()));
        }
        if self.max_auth_body == 0 {
            return Err(GatewayError::Config("max_auth_body cannot be 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listens_on_all_interfaces() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.addr().to_string(), "0.0.0.0:8086");
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let config = ApiConfig {
            max_upload_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GatewayError::Config(_))));
    }
}
