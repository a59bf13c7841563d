//! Record lookups with trust enforcement.
//!
//! `DnssecLookup` refuses any answer whose chain of trust did not validate.
//! `NamecoinLookup` serves `.bit` labels from a Namecoin node, whose trust
//! comes from the blockchain rather than DNSSEC.

use crate::{Backend, Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use wns_net::{DnssecClient, NamecoinClient, RecordType, QUERY_OK};

/// Source of TXT-equivalent records for one backend
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Backend this source serves
    fn backend(&self) -> Backend;

    /// Fetch the record for `label`; `None` when the label has no record
    async fn lookup(&self, label: &str) -> Result<Option<String>>;
}

/// DNSSEC-enforcing DNS lookups
#[derive(Clone)]
pub struct DnssecLookup {
    client: Arc<dyn DnssecClient>,
    trust_anchor: PathBuf,
}

impl DnssecLookup {
    /// Create a lookup; fails with `Error::Config` if the trust anchor is unreadable
    pub fn new(client: Arc<dyn DnssecClient>, trust_anchor: impl Into<PathBuf>) -> Result<Self> {
        let trust_anchor = trust_anchor.into();
        ensure_trust_anchor(&trust_anchor)?;
        Ok(Self {
            client,
            trust_anchor,
        })
    }

    /// Trust anchor file in use
    pub fn trust_anchor(&self) -> &Path {
        &self.trust_anchor
    }

    /// Query `label` and return the first payload of a secure answer.
    ///
    /// Only the first entry is used; any further entries are ignored.
    pub async fn secure_lookup(
        &self,
        label: &str,
        record_type: RecordType,
    ) -> Result<Option<String>> {
        ensure_trust_anchor(&self.trust_anchor)?;

        debug!("DNSSEC lookup: {} {}", label, record_type);
        let response = self
            .client
            .query(label, record_type)
            .await
            .map_err(|e| lookup_failed(label, e.to_string()))?;

        if response.status != QUERY_OK {
            return Err(lookup_failed(
                label,
                format!("resolver returned status {}", response.status),
            ));
        }

        let result = response.result;
        if result.bogus {
            warn!("DNSSEC validation failed for {}", label);
            return Err(Error::InsecureResult {
                label: label.to_string(),
                reason: "validation failed (bogus)".to_string(),
            });
        }
        if !result.secure {
            warn!("DNSSEC chain of trust incomplete for {}", label);
            return Err(Error::InsecureResult {
                label: label.to_string(),
                reason: "chain of trust incomplete (insecure)".to_string(),
            });
        }

        if !result.havedata {
            return Ok(None);
        }

        let mut entries = result.data.into_iter();
        let Some(first) = entries.next() else {
            return Ok(None);
        };
        let ignored = entries.count();
        if ignored > 0 {
            warn!("Ignoring {} additional {} entries for {}", ignored, record_type, label);
        }

        String::from_utf8(first)
            .map(Some)
            .map_err(|e| Error::MalformedRecord {
                label: label.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl RecordSource for DnssecLookup {
    fn backend(&self) -> Backend {
        Backend::Dns
    }

    async fn lookup(&self, label: &str) -> Result<Option<String>> {
        self.secure_lookup(label, RecordType::Txt).await
    }
}

/// Namecoin lookups for `.bit` labels
#[derive(Clone, Default)]
pub struct NamecoinLookup {
    client: Option<Arc<dyn NamecoinClient>>,
}

impl NamecoinLookup {
    /// Create a lookup; with no client every call fails with `AlternateBackendUnavailable`
    pub fn new(client: Option<Arc<dyn NamecoinClient>>) -> Self {
        Self { client }
    }

    /// Whether a Namecoin client is configured
    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl RecordSource for NamecoinLookup {
    fn backend(&self) -> Backend {
        Backend::Namecoin
    }

    async fn lookup(&self, label: &str) -> Result<Option<String>> {
        let client = self.client.as_ref().ok_or_else(|| {
            Error::AlternateBackendUnavailable(format!(
                "no Namecoin node configured to resolve {}",
                label
            ))
        })?;

        debug!("Namecoin lookup: {}", label);
        client.resolve(label).await.map_err(|e| Error::LookupFailed {
            label: label.to_string(),
            backend: Backend::Namecoin,
            reason: e.to_string(),
        })
    }
}

fn lookup_failed(label: &str, reason: String) -> Error {
    Error::LookupFailed {
        label: label.to_string(),
        backend: Backend::Dns,
        reason,
    }
}

pub(crate) fn ensure_trust_anchor(path: &Path) -> Result<()> {
    match std::fs::File::open(path) {
        Ok(file) if file.metadata().map(|m| m.is_file()).unwrap_or(false) => Ok(()),
        _ => Err(Error::Config(format!(
            "Trust anchor is missing or inaccessible: {}",
            path.display()
        ))),
    }
}
