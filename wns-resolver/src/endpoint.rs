//! Endpoint safety classification.
//!
//! A URL published in a wallet name record must not be able to point this
//! process at loopback, private or otherwise internal addresses. URLs that
//! fail any check are handed back as opaque data and never fetched.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tracing::{debug, warn};
use url::{Host, Url};
use wns_net::HostResolver;

/// Outcome of classifying an endpoint URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointClassification {
    /// Safe to fetch; carries the original URL
    Fetchable(String),
    /// Must not be fetched; carries the original URL as literal data
    Opaque(String),
}

impl EndpointClassification {
    /// Whether the URL may be fetched
    pub fn is_fetchable(&self) -> bool {
        matches!(self, Self::Fetchable(_))
    }

    /// The URL, whichever way it was classified
    pub fn url(&self) -> &str {
        match self {
            Self::Fetchable(url) | Self::Opaque(url) => url,
        }
    }
}

/// Classifies URLs by where they would connect
#[derive(Clone)]
pub struct EndpointGuard {
    hosts: Arc<dyn HostResolver>,
}

impl EndpointGuard {
    /// Create a guard resolving hostnames through `hosts`
    pub fn new(hosts: Arc<dyn HostResolver>) -> Self {
        Self { hosts }
    }

    /// Classify `url` as fetchable or opaque. Never fails.
    pub async fn classify_endpoint(&self, url: &str) -> EndpointClassification {
        let opaque = || EndpointClassification::Opaque(url.to_string());

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Endpoint {} is not a valid URL: {}", url, e);
                return opaque();
            }
        };

        let candidates: Vec<IpAddr> = match parsed.host() {
            None => return opaque(),
            Some(Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
            Some(Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
            Some(Host::Domain(domain)) => {
                let domain = domain.trim_end_matches('.');
                if domain.is_empty() || domain.eq_ignore_ascii_case("localhost") {
                    warn!("Endpoint {} targets localhost, not fetching", url);
                    return opaque();
                }
                match self.hosts.lookup(domain).await {
                    Ok(addrs) => addrs,
                    Err(e) => {
                        debug!("Endpoint host {} did not resolve: {}", domain, e);
                        return opaque();
                    }
                }
            }
        };

        if candidates.is_empty() || !candidates.iter().copied().all(is_routable) {
            warn!(
                "Endpoint {} resolves to a non-routable address {:?}, not fetching",
                url, candidates
            );
            return opaque();
        }

        EndpointClassification::Fetchable(url.to_string())
    }
}

/// Whether `ip` is a globally routable unicast address
pub fn is_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_routable_v4(v4),
        IpAddr::V6(v6) => is_routable_v6(v6),
    }
}

fn is_routable_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();

    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        // 0.0.0.0/8 "this network"
        || a == 0
        // 100.64.0.0/10 shared address space
        || (a == 100 && (b & 0xc0) == 64)
        // 192.0.0.0/24 protocol assignments
        || (a == 192 && b == 0 && ip.octets()[2] == 0)
        // 198.18.0.0/15 benchmarking
        || (a == 198 && (b & 0xfe) == 18)
        // 240.0.0.0/4 reserved
        || a >= 240)
}

fn is_routable_v6(ip: Ipv6Addr) -> bool {
    if ip.is_unspecified() || ip.is_loopback() {
        return false;
    }
    if let Some(v4) = embedded_ipv4(ip) {
        return is_routable_v4(v4);
    }

    let segments = ip.segments();
    !(ip.is_multicast()
        || ip.is_loopback()
        || ip.is_multicast()
        // fc00::/7 unique local
        || (segments[0] & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (segments[0] & 0xffc0) == 0xfe80
        // fec0::/10 deprecated site local
        || (segments[0] & 0xffc0) == 0xfec0
        // 2001:db8::/32 documentation
        || (segments[0] == 0x2001 && segments[1] == 0x0db8)
        // 64:ff9b:1::/48 local-use translation
        || (segments[0] == 0x0064 && segments[1] == 0xff9b && segments[2] == 0x0001)
        // 100::/64 discard-only
        || (segments[0] == 0x0100 && segments[1..4] == [0, 0, 0])
        // 2001::/32 Teredo
        || (segments[0] == 0x2001 && segments[1] == 0))
}

/// IPv4 address carried inside a translation or tunnelling prefix
fn embedded_ipv4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    let s = ip.segments();
    let from_segments = |hi: u16, lo: u16| {
        let [a, b] = hi.to_be_bytes();
        let [c, d] = lo.to_be_bytes();
        Ipv4Addr::new(a, b, c, d)
    };

    match s {
        // ::ffff:0:0/96 mapped and ::/96 compatible
        [0, 0, 0, 0, 0, 0xffff | 0, _, _] => ip.to_ipv4(),
        // 64:ff9b::/96 NAT64
        [0x0064, 0xff9b, 0, 0, 0, 0, hi, lo] => Some(from_segments(hi, lo)),
        // 2002::/16 6to4, address in bits 16..48
        [0x2002, hi, lo, ..] => Some(from_segments(hi, lo)),
        _ => None,
    }
}
