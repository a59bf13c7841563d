//! Network collaborators for wallet name resolution
//!
//! Provides the DNSSEC-validating stub resolver, hostname resolution, the
//! follow-up HTTP fetcher and the Namecoin RPC client. Each sits behind a
//! trait so resolution logic can run against any implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dns;
pub mod dnssec;
pub mod error;
pub mod host;
pub mod http;
pub mod namecoin;

// Re-export main types
pub use dns::{DnsConfig, DnsProvider, RecordType, DEFAULT_TRUST_ANCHOR};
pub use dnssec::{DnssecClient, DnssecResponse, DnssecResult, HickoryDnssecClient, QUERY_OK};
pub use error::{Error, Result};
pub use host::{HostResolver, SystemResolver};
pub use http::{HttpConfig, HttpFetcher, ReqwestFetcher};
pub use namecoin::{NamecoinClient, NamecoinConfig, NamecoinRpcClient, DEFAULT_NAMECOIN_PORT};
