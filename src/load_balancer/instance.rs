//! Backend instance abstraction.
//!
//! # Responsibilities
//! - Represent a single price-service process by its `host:port`
//! - Pre-compute the base URL used for every outbound call

use std::fmt;
use thiserror::Error;
use url::Url;

/// Reasons an instance address is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("expected host:port")]
    MissingPort,

    #[error("empty host")]
    EmptyHost,

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("not a valid authority: {0}")]
    Url(String),
}

/// A single backend instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// The configured address, as given.
    address: String,
    /// Pre-calculated base URL.
    base_url: Url,
}

impl Instance {
    /// Parse a `host:port` address.
    pub fn parse(address: &str) -> Result<Self, InstanceError> {
        let address = address.trim();
        let (host, port) = address.rsplit_once(':').ok_or(InstanceError::MissingPort)?;
        if host.is_empty() {
            return Err(InstanceError::EmptyHost);
        }
        port.parse::<u16>()
            .map_err(|_| InstanceError::InvalidPort(port.to_string()))?;
        if host.contains('/') {
            return Err(InstanceError::Url(address.to_string()));
        }

        let base_url = Url::parse(&format!("http://{}", address))
            .map_err(|e| InstanceError::Url(e.to_string()))?;

        Ok(Self {
            address: address.to_string(),
            base_url,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of an operation path on this instance.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_port() {
        let instance = Instance::parse("localhost:8081").unwrap();
        assert_eq!(instance.address(), "localhost:8081");
        assert_eq!(instance.url_for("/retail"), "http://localhost:8081/retail");
        assert_eq!(instance.url_for("wholesale"), "http://localhost:8081/wholesale");
    }

    #[test]
    fn test_parse_rejects_bad_addresses() {
        assert_eq!(Instance::parse("localhost"), Err(InstanceError::MissingPort));
        assert_eq!(Instance::parse(":8081"), Err(InstanceError::EmptyHost));
        assert_eq!(
            Instance::parse("localhost:http"),
            Err(InstanceError::InvalidPort("http".into()))
        );
        assert!(Instance::parse("http://localhost:8081").is_err());
    }

    #[test]
    fn test_default_port_is_normalized() {
        let instance = Instance::parse("example.com:80").unwrap();
        assert_eq!(instance.url_for("/retail"), "http://example.com/retail");
        assert_eq!(instance.to_string(), "example.com:80");
    }
}
