//! Upstream resolver selection.
//!
//! The `System` provider reads the nameservers from the configured
//! resolv.conf. The DoH providers send queries over HTTPS to a public
//! resolver. DNSSEC validation happens locally either way.

use crate::{Error, Result};
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::system_conf::parse_resolv_conf;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default system resolver configuration path
pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";

/// Default timeout applied to every DNS request
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(30);

/// Port used for `Custom` nameservers
pub const DNS_PORT: u16 = 53;

/// DNS resolver provider
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DnsProvider {
    /// Nameservers listed in resolv.conf
    #[default]
    #[serde(rename = "system")]
    System,
    /// Cloudflare DoH (1.1.1.1)
    #[serde(rename = "cloudflare")]
    CloudflareDoH,
    /// Quad9 DoH (9.9.9.9)
    #[serde(rename = "quad9")]
    Quad9DoH,
    /// Google DoH (8.8.8.8)
    #[serde(rename = "google")]
    GoogleDoH,
    /// Explicit nameservers, queried on port 53
    #[serde(rename = "custom")]
    Custom(Vec<IpAddr>),
}

impl DnsProvider {
    /// Get provider name for display
    pub fn name(&self) -> &str {
        match self {
            Self::CloudflareDoH => "Cloudflare (1.1.1.1)",
            Self::Quad9DoH => "Quad9 (9.9.9.9)",
            Self::GoogleDoH => "Google (8.8.8.8)",
            Self::Custom(_) => "Custom nameservers",
            Self::System => "System (resolv.conf)",
        }
    }

    /// Whether queries travel over an encrypted transport
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::CloudflareDoH | Self::Quad9DoH | Self::GoogleDoH)
    }

    /// Upstream configuration for this provider, reading `resolv_conf` for `System`
    pub(crate) fn resolver_config(&self, resolv_conf: &Path) -> Result<(ResolverConfig, ResolverOpts)> {
        let (config, opts) = match self {
            Self::System => {
                let contents = std::fs::read(resolv_conf).map_err(|e| {
                    Error::Config(format!(
                        "cannot read resolver configuration {}: {}",
                        resolv_conf.display(),
                        e
                    ))
                })?;
                parse_resolv_conf(&contents).map_err(|e| {
                    Error::Config(format!(
                        "invalid resolver configuration {}: {}",
                        resolv_conf.display(),
                        e
                    ))
                })?
            }
            Self::CloudflareDoH => (ResolverConfig::cloudflare_https(), ResolverOpts::default()),
            Self::Quad9DoH => (ResolverConfig::quad9_https(), ResolverOpts::default()),
            Self::GoogleDoH => (ResolverConfig::google_https(), ResolverOpts::default()),
            Self::Custom(servers) => (
                ResolverConfig::from_parts(
                    None,
                    Vec::new(),
                    NameServerConfigGroup::from_ips_clear(servers, DNS_PORT, true),
                ),
                ResolverOpts::default(),
            ),
        };

        if config.name_servers().is_empty() {
            return Err(Error::Config(match self {
                Self::System => format!("no nameserver entry in {}", resolv_conf.display()),
                _ => format!("{} has no nameservers", self.name()),
            }));
        }

        Ok((config, opts))
    }
}

/// Record types the resolver queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Text record
    Txt,
}

impl RecordType {
    /// Mnemonic
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Txt => "TXT",
        }
    }

    pub(crate) fn to_wire(self) -> hickory_proto::rr::RecordType {
        match self {
            Self::A => hickory_proto::rr::RecordType::A,
            Self::Aaaa => hickory_proto::rr::RecordType::AAAA,
            Self::Txt => hickory_proto::rr::RecordType::TXT,
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DNS resolver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsConfig {
    /// DNS provider
    pub provider: DnsProvider,
    /// System resolver configuration, consulted by the `System` provider
    pub resolv_conf: PathBuf,
    /// DNSSEC root trust anchor (DNSKEY records in zone file format)
    pub trust_anchor: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            provider: DnsProvider::System,
            resolv_conf: PathBuf::from(DEFAULT_RESOLV_CONF),
            trust_anchor: PathBuf::from(DEFAULT_TRUST_ANCHOR),
            timeout: DEFAULT_DNS_TIMEOUT,
        }
    }
}

/// Default DNSSEC root trust anchor path
pub const DEFAULT_TRUST_ANCHOR: &str = "/usr/local/etc/unbound/root.key";
