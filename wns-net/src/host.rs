//! Hostname to address resolution.
//!
//! Used to decide where a URL would actually connect before anything is
//! fetched from it, so it resolves through the same system resolver the
//! HTTP client connects through.

use crate::{Error, Result};
use async_trait::async_trait;
use std::net::IpAddr;
use tracing::debug;

/// Resolves hostnames to IP addresses
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `host` to every address it maps to
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// System resolver (getaddrinfo via tokio)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    /// Create new resolver
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        use tokio::net::lookup_host;

        let addrs: Vec<IpAddr> = lookup_host((host, 0))
            .await
            .map_err(|e| Error::Dns(format!("DNS resolution failed for {}: {}", host, e)))?
            .map(|addr| addr.ip())
            .collect();

        debug!("Resolved {} to {:?}", host, addrs);

        Ok(addrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_resolves_ip_literal() {
        let addrs = SystemResolver::new().lookup("127.0.0.1").await.unwrap();
        assert_eq!(addrs, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_system_resolves_ipv6_literal() {
        let addrs = SystemResolver::new().lookup("::1").await.unwrap();
        assert_eq!(addrs, vec!["::1".parse::<IpAddr>().unwrap()]);
    }
}
