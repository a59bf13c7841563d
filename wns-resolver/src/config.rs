//! Resolver configuration
//!
//! An immutable value built once with `with_*` methods, optionally loaded
//! from or saved to a JSON file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wns_net::dns::DEFAULT_RESOLV_CONF;
use wns_net::{
    DnsConfig, DnsProvider, HttpConfig, NamecoinConfig, DEFAULT_NAMECOIN_PORT, DEFAULT_TRUST_ANCHOR,
};

/// Default timeout for every collaborator request, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Namecoin node connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamecoinSettings {
    /// RPC host
    pub host: String,
    /// RPC port
    #[serde(default = "default_namecoin_port")]
    pub port: u16,
    /// RPC user
    #[serde(default)]
    pub user: Option<String>,
    /// RPC password
    #[serde(default)]
    pub password: Option<String>,
    /// Directory holding the node's RPC cookie file
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl NamecoinSettings {
    /// Settings for `host` with the default port and no credentials
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_NAMECOIN_PORT,
            user: None,
            password: None,
            temp_dir: None,
        }
    }

    /// Set the RPC port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set RPC user and password
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set the temp directory
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }
}

impl fmt::Debug for NamecoinSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamecoinSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}

/// Wallet name resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// System resolver configuration
    #[serde(default = "default_resolv_conf")]
    pub resolv_conf: PathBuf,
    /// DNSSEC trust anchor file
    #[serde(default = "default_trust_anchor")]
    pub trust_anchor: PathBuf,
    /// Validating resolver used for DNSSEC queries
    #[serde(default)]
    pub dns_provider: DnsProvider,
    /// Timeout for DNS, HTTP and Namecoin requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Namecoin node, for `.bit` names
    #[serde(default)]
    pub namecoin: Option<NamecoinSettings>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolv_conf: default_resolv_conf(),
            trust_anchor: default_trust_anchor(),
            dns_provider: DnsProvider::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            namecoin: None,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Override the resolv.conf path
    pub fn with_resolv_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolv_conf = path.into();
        self
    }

    /// Override the trust anchor path
    pub fn with_trust_anchor(mut self, path: impl Into<PathBuf>) -> Self {
        self.trust_anchor = path.into();
        self
    }

    /// Override the DNS provider
    pub fn with_dns_provider(mut self, provider: DnsProvider) -> Self {
        self.dns_provider = provider;
        self
    }

    /// Override the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Enable the Namecoin backend
    pub fn with_namecoin(mut self, settings: NamecoinSettings) -> Self {
        self.namecoin = Some(settings);
        self
    }

    /// Disable the Namecoin backend
    pub fn without_namecoin(mut self) -> Self {
        self.namecoin = None;
        self
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// DNS collaborator configuration
    pub fn dns_config(&self) -> DnsConfig {
        DnsConfig {
            provider: self.dns_provider.clone(),
            resolv_conf: self.resolv_conf.clone(),
            trust_anchor: self.trust_anchor.clone(),
            timeout: self.request_timeout(),
        }
    }

    /// HTTP collaborator configuration
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: self.request_timeout(),
            ..HttpConfig::default()
        }
    }

    /// Namecoin collaborator configuration, if enabled
    pub fn namecoin_config(&self) -> Option<NamecoinConfig> {
        self.namecoin.as_ref().map(|settings| NamecoinConfig {
            host: settings.host.clone(),
            port: settings.port,
            user: settings.user.clone(),
            password: settings.password.clone(),
            temp_dir: settings.temp_dir.clone(),
            timeout: self.request_timeout(),
        })
    }
}

fn default_resolv_conf() -> PathBuf {
    PathBuf::from(DEFAULT_RESOLV_CONF)
}

fn default_trust_anchor() -> PathBuf {
    PathBuf::from(DEFAULT_TRUST_ANCHOR)
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_namecoin_port() -> u16 {
    DEFAULT_NAMECOIN_PORT
}
