//! Follow-up HTTP fetches

use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for follow-up fetches
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues GET requests and returns the response body text
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `url` with the given extra headers
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<String>;
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: concat!("wns-resolver/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// `HttpFetcher` backed by reqwest.
///
/// Redirects are not followed: the target URL has already been vetted and a
/// redirect would point the request somewhere that has not.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Create new fetcher
    pub fn new(config: &HttpConfig) -> Result<Self> {
        info!("Creating HTTP fetcher (timeout {:?})", config.timeout);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Http(format!("HTTP client error: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<String> {
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!(
                "GET {} returned status {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Http(format!("Failed to read body from {}: {}", url, e)))
    }
}
