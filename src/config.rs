use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::error::DnsError;

/// Loopback address the server listens on unless told otherwise
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:2053";

/// How long to wait for each upstream reply, in milliseconds
pub const DEFAULT_RESOLVER_TIMEOUT_MS: u64 = 2000;

/// Runtime settings for the DNS server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub resolver: Option<SocketAddr>,
    pub resolver_timeout: Duration,
}

impl ServerConfig {
    /// Build the configuration from command line values.
    /// Addresses are resolved here, once, so a bad `host:port` fails at startup.
    pub fn new(
        bind_addr: &str,
        resolver: Option<&str>,
        resolver_timeout_ms: u64,
    ) -> Result<Self, DnsError> {
        if resolver_timeout_ms == 0 {
            return Err(DnsError::ZeroTimeout);
        }

        Ok(Self {
            bind_addr: resolve_address(bind_addr)?,
            resolver: resolver.map(resolve_address).transpose()?,
            resolver_timeout: Duration::from_millis(resolver_timeout_ms),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 2053)),
            resolver: None,
            resolver_timeout: Duration::from_millis(DEFAULT_RESOLVER_TIMEOUT_MS),
        }
    }
}

/// Turn a `host:port` string into the first socket address it names
pub fn resolve_address(addr: &str) -> Result<SocketAddr, DnsError> {
    addr.to_socket_addrs()
        .map_err(|e| DnsError::InvalidAddress(format!("{addr}: {e}")))?
        .next()
        .ok_or_else(|| DnsError::InvalidAddress(format!("{addr}: no address found")))
}
