//! Namecoin name lookups over the node's JSON-RPC interface.
//!
//! A label such as `_btc._wallet.wallet.example.bit` is read from the
//! `d/example` name: the remaining sub-labels are walked right to left
//! through the value's nested `map` objects and the `txt` field of the final
//! node is returned.

use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Default Namecoin RPC port
pub const DEFAULT_NAMECOIN_PORT: u16 = 8336;

/// Name of the RPC cookie file looked up in the temp directory
pub const COOKIE_FILE: &str = ".cookie";

/// RPC error code for an unknown name
const RPC_NAME_NOT_FOUND: i64 = -4;

/// Namecoin client configuration
#[derive(Clone, PartialEq, Eq)]
pub struct NamecoinConfig {
    /// RPC host
    pub host: String,
    /// RPC port
    pub port: u16,
    /// RPC user
    pub user: Option<String>,
    /// RPC password
    pub password: Option<String>,
    /// Directory holding the RPC cookie file, used when no user/password is set
    pub temp_dir: Option<PathBuf>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl fmt::Debug for NamecoinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamecoinConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("temp_dir", &self.temp_dir)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Blockchain-backed name lookups
#[async_trait]
pub trait NamecoinClient: Send + Sync {
    /// Return the TXT-equivalent value stored for `label`, if any
    async fn resolve(&self, label: &str) -> Result<Option<String>>;
}

/// Namecoin JSON-RPC client
pub struct NamecoinRpcClient {
    client: reqwest::Client,
    url: String,
    credentials: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<NameShow>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct NameShow {
    value: String,
}

impl NamecoinRpcClient {
    /// Create a client for the configured node
    pub fn new(config: &NamecoinConfig) -> Result<Self> {
        if config.host.trim().is_empty() {
            return Err(Error::Config("Namecoin host is empty".to_string()));
        }

        let url = format!("http://{}:{}/", config.host, config.port);
        reqwest::Url::parse(&url)
            .map_err(|e| Error::Config(format!("invalid Namecoin RPC address {}: {}", url, e)))?;

        let credentials = match (&config.user, &config.password, &config.temp_dir) {
            (Some(user), Some(password), _) => Some((user.clone(), password.clone())),
            (_, _, Some(dir)) => Some(read_cookie(dir.join(COOKIE_FILE))?),
            _ => None,
        };

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Namecoin(format!("HTTP client error: {}", e)))?;

        info!("Creating Namecoin RPC client for {}", url);

        Ok(Self {
            client,
            url,
            credentials,
        })
    }

    async fn name_show(&self, name: &str) -> Result<Option<String>> {
        let body = serde_json::json!({
            "jsonrpc": "1.0",
            "id": "wns",
            "method": "name_show",
            "params": [name],
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Namecoin(format!("RPC request failed: {}", e)))?;

        // The node reports RPC errors with a 500 status and a JSON body.
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Namecoin(format!("Failed to read RPC response: {}", e)))?;
        let parsed: RpcResponse = serde_json::from_str(&text).map_err(|_| {
            Error::Namecoin(format!("unexpected RPC response (HTTP {})", status))
        })?;

        match (parsed.result, parsed.error) {
            (_, Some(err)) if err.code == RPC_NAME_NOT_FOUND => Ok(None),
            (_, Some(err)) => Err(Error::Namecoin(format!(
                "name_show {} failed: {} ({})",
                name, err.message, err.code
            ))),
            (Some(show), None) => Ok(Some(show.value)),
            (None, None) => Ok(None),
        }
    }
}

#[async_trait]
impl NamecoinClient for NamecoinRpcClient {
    async fn resolve(&self, label: &str) -> Result<Option<String>> {
        let (name, path) = split_bit_label(label)?;
        debug!("Namecoin lookup: {} -> {} {:?}", label, name, path);

        let Some(value) = self.name_show(&name).await? else {
            return Ok(None);
        };

        let value: Value = serde_json::from_str(&value)
            .map_err(|e| Error::Namecoin(format!("invalid value for {}: {}", name, e)))?;

        Ok(find_txt(&value, &path))
    }
}

fn read_cookie(path: PathBuf) -> Result<(String, String)> {
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("cannot read RPC cookie {}: {}", path.display(), e))
    })?;
    let (user, password) = contents
        .trim()
        .split_once(':')
        .ok_or_else(|| Error::Config(format!("malformed RPC cookie {}", path.display())))?;
    Ok((user.to_string(), password.to_string()))
}

/// Split a `.bit` label into its `d/` name and the sub-label path, outermost first
pub fn split_bit_label(label: &str) -> Result<(String, Vec<String>)> {
    let labels: Vec<&str> = label.trim_end_matches('.').split('.').collect();

    match labels.as_slice() {
        [rest @ .., domain, tld] if tld.eq_ignore_ascii_case("bit") && !domain.is_empty() => {
            let path = rest.iter().rev().map(|l| l.to_ascii_lowercase()).collect();
            Ok((format!("d/{}", domain.to_ascii_lowercase()), path))
        }
        _ => Err(Error::Namecoin(format!("not a .bit name: {}", label))),
    }
}

fn find_txt(value: &Value, path: &[String]) -> Option<String> {
    let mut node = value;
    for label in path {
        node = node.get("map")?.get(label.as_str())?;
    }

    match node.get("txt")? {
        Value::String(txt) => Some(txt.clone()),
        Value::Array(entries) => match entries.first()? {
            Value::String(txt) => Some(txt.clone()),
            Value::Array(parts) => Some(parts.iter().filter_map(Value::as_str).collect()),
            _ => None,
        },
        _ => None,
    }
}
