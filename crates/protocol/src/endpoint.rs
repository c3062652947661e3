use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing an [`Endpoint`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("missing port in {0:?} (expected host:port)")]
    MissingPort(String),

    #[error("empty host in {0:?}")]
    EmptyHost(String),

    #[error("invalid port {0:?}")]
    InvalidPort(String),
}

/// Remote TCP listener address.
///
/// The host is kept as given (name or literal address) and resolved only
/// when a connection is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    /// Parses `host:port`, with IPv6 literals written as `[addr]:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| EndpointError::MissingPort(s.to_string()))?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(EndpointError::EmptyHost(s.to_string()));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| EndpointError::InvalidPort(port.to_string()))?;

        Ok(Self::new(host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_host_and_port() {
        let ep: Endpoint = "example.com:9000".parse().unwrap();
        assert_eq!(ep, Endpoint::new("example.com", 9000));
    }

    #[test]
    fn parse_ipv6_literal() {
        let ep: Endpoint = "[::1]:8080".parse().unwrap();
        assert_eq!(ep.host, "::1");
        assert_eq!(ep.port, 8080);
        assert_eq!(ep.to_string(), "[::1]:8080");
    }

    #[test]
    fn parse_rejects_missing_port() {
        assert!(matches!(
            "localhost".parse::<Endpoint>(),
            Err(EndpointError::MissingPort(_))
        ));
    }

    #[test]
    fn parse_rejects_bad_port() {
        assert!(matches!(
            "localhost:70000".parse::<Endpoint>(),
            Err(EndpointError::InvalidPort(_))
        ));
        assert!(matches!(
            "localhost:http".parse::<Endpoint>(),
            Err(EndpointError::InvalidPort(_))
        ));
    }

    #[test]
    fn parse_rejects_empty_host() {
        assert!(matches!(
            ":9000".parse::<Endpoint>(),
            Err(EndpointError::EmptyHost(_))
        ));
    }

    #[test]
    fn display_roundtrip() {
        let ep = Endpoint::new("10.0.0.7", 5555);
        assert_eq!(ep.to_string().parse::<Endpoint>().unwrap(), ep);
    }
}
