//! Payload decode chain.
//!
//! One record payload is interpreted, in order, as a `bitcoin:` URI, a
//! base64-encoded endpoint URL, base64-encoded opaque data, or a raw literal.

use crate::endpoint::{EndpointClassification, EndpointGuard};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};
use wns_net::HttpFetcher;

/// Prefix of a complete payment URI
pub const BITCOIN_URI_PREFIX: &str = "bitcoin:";

/// Header carrying the resolving client's address on follow-up fetches
pub const FORWARDED_FOR_HEADER: &str = "X-Forwarded-For";

/// Terminal value produced by the decode chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalValue {
    /// Payment URI published as-is
    PaymentUri(String),
    /// Body fetched from a resolved endpoint
    Fetched(String),
    /// Address, decoded data, or an endpoint URL that must not be fetched
    Literal(String),
}

impl FinalValue {
    /// Value as a string
    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentUri(v) | Self::Fetched(v) | Self::Literal(v) => v,
        }
    }

    /// Consume into the inner string
    pub fn into_inner(self) -> String {
        match self {
            Self::PaymentUri(v) | Self::Fetched(v) | Self::Literal(v) => v,
        }
    }
}

impl fmt::Display for FinalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interprets record payloads into final values
#[derive(Clone)]
pub struct PayloadInterpreter {
    guard: EndpointGuard,
    http: Arc<dyn HttpFetcher>,
}

impl PayloadInterpreter {
    /// Create an interpreter using `guard` to vet URLs and `http` to fetch them
    pub fn new(guard: EndpointGuard, http: Arc<dyn HttpFetcher>) -> Self {
        Self { guard, http }
    }

    /// Interpret one payload.
    ///
    /// At most one HTTP fetch is issued, and only for a base64-encoded
    /// http(s) URL whose host the guard classifies as fetchable. A failed
    /// fetch is reported as `Error::Resolution`.
    pub async fn interpret_payload(
        &self,
        raw: &str,
        client_ip: Option<IpAddr>,
    ) -> Result<FinalValue> {
        if raw.starts_with(BITCOIN_URI_PREFIX) {
            return Ok(FinalValue::PaymentUri(raw.to_string()));
        }

        let Some(decoded) = decode_base64_text(raw) else {
            debug!("Payload is not base64 text, returning literal");
            return Ok(FinalValue::Literal(raw.to_string()));
        };

        if !is_http_url(&decoded) {
            return Ok(FinalValue::Literal(decoded));
        }

        match self.guard.classify_endpoint(&decoded).await {
            EndpointClassification::Fetchable(url) => self.fetch(url, client_ip).await,
            EndpointClassification::Opaque(literal) => Ok(FinalValue::Literal(literal)),
        }
    }

    async fn fetch(&self, url: String, client_ip: Option<IpAddr>) -> Result<FinalValue> {
        let headers: Vec<(String, String)> = client_ip
            .map(|ip| vec![(FORWARDED_FOR_HEADER.to_string(), ip.to_string())])
            .unwrap_or_default();

        info!("Fetching resolved endpoint {}", url);
        match self.http.get(&url, &headers).await {
            Ok(body) => Ok(FinalValue::Fetched(body)),
            Err(e) => Err(Error::Resolution {
                url,
                reason: e.to_string(),
            }),
        }
    }
}

fn decode_base64_text(raw: &str) -> Option<String> {
    let bytes = STANDARD.decode(raw.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

fn is_http_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}
