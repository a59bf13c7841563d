//! DNSSEC-validated record queries.
//!
//! Validation runs locally, from the configured root trust anchor down. The
//! client reports the proof outcome of each answer; enforcing the chain of
//! trust on top of that is the caller's job.

use crate::dns::{DnsConfig, RecordType};
use crate::{Error, Result};
use async_trait::async_trait;
use hickory_proto::dnssec::{Proof, TrustAnchors};
use hickory_proto::rr::RData;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Status reported for a query the resolver answered
pub const QUERY_OK: i32 = 0;

/// DNS response code: no error
pub const RCODE_NOERROR: u16 = 0;
/// DNS response code: server failure
pub const RCODE_SERVFAIL: u16 = 2;
/// DNS response code: name does not exist
pub const RCODE_NXDOMAIN: u16 = 3;

/// Validation outcome and payload of one query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnssecResult {
    /// DNS response code of the answer
    pub rcode: u16,
    /// Full chain of trust validated
    pub secure: bool,
    /// Validation attempted and failed
    pub bogus: bool,
    /// At least one record of the requested type was returned
    pub havedata: bool,
    /// Record payloads, in answer order
    pub data: Vec<Vec<u8>>,
}

/// One query outcome: a status code and the validation result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnssecResponse {
    /// `QUERY_OK` when the resolver produced an answer
    pub status: i32,
    /// Validation result; meaningful only when `status == QUERY_OK`
    pub result: DnssecResult,
}

impl DnssecResponse {
    /// Successful query carrying `result`
    pub fn ok(result: DnssecResult) -> Self {
        Self {
            status: QUERY_OK,
            result,
        }
    }

    /// Failed query with the given status
    pub fn failed(status: i32) -> Self {
        Self {
            status,
            result: DnssecResult::default(),
        }
    }
}

/// DNSSEC-validating resolver
#[async_trait]
pub trait DnssecClient: Send + Sync {
    /// Query `name` for records of `record_type`
    async fn query(&self, name: &str, record_type: RecordType) -> Result<DnssecResponse>;
}

/// Validating stub resolver seeded from a root trust anchor file
pub struct HickoryDnssecClient {
    resolver: TokioResolver,
}

impl HickoryDnssecClient {
    /// Create a client for the configured provider and trust anchor
    pub fn new(config: &DnsConfig) -> Result<Self> {
        let anchors = load_trust_anchors(&config.trust_anchor)?;
        let (resolver_config, mut opts) = config.provider.resolver_config(&config.resolv_conf)?;
        opts.validate = true;
        opts.edns0 = true;
        opts.timeout = config.timeout;

        info!(
            "Creating DNSSEC client: {} (trust anchor {})",
            config.provider.name(),
            config.trust_anchor.display()
        );

        let resolver =
            TokioResolver::builder_with_config(resolver_config, TokioConnectionProvider::default())
                .with_options(opts)
                .with_trust_anchor(Arc::new(anchors))
                .build();

        Ok(Self { resolver })
    }
}

#[async_trait]
impl DnssecClient for HickoryDnssecClient {
    async fn query(&self, name: &str, record_type: RecordType) -> Result<DnssecResponse> {
        debug!("DNSSEC query: {} {}", name, record_type);
        let wanted = record_type.to_wire();

        match self.resolver.lookup(name, wanted).await {
            Ok(lookup) => {
                let answers = lookup
                    .records()
                    .iter()
                    .filter(|record| record.record_type() == wanted)
                    .map(|record| (record.proof(), rdata_bytes(record.data())))
                    .collect();
                Ok(proven_response(Answer::Records(answers)))
            }
            Err(e) if e.is_nx_domain() => Ok(proven_response(Answer::NoRecords {
                rcode: RCODE_NXDOMAIN,
            })),
            Err(e) if e.is_no_records_found() => Ok(proven_response(Answer::NoRecords {
                rcode: RCODE_NOERROR,
            })),
            Err(e) => {
                warn!("DNSSEC query for {} ({}) failed: {}", name, record_type, e);
                Ok(proven_response(Answer::Failed))
            }
        }
    }
}

/// What the validating resolver produced for one query
#[derive(Debug)]
enum Answer {
    /// Records of the requested type with their proof outcomes
    Records(Vec<(Proof, Vec<u8>)>),
    /// Validated negative answer
    NoRecords { rcode: u16 },
    /// Upstream failure, timeout, or an answer validation rejected outright
    Failed,
}

fn proven_response(answer: Answer) -> DnssecResponse {
    match answer {
        Answer::Records(records) => {
            let bogus = records.iter().any(|(proof, _)| matches!(proof, Proof::Bogus));
            let secure = records.iter().all(|(proof, _)| matches!(proof, Proof::Secure));
            let data: Vec<Vec<u8>> = records.into_iter().map(|(_, data)| data).collect();

            DnssecResponse::ok(DnssecResult {
                rcode: RCODE_NOERROR,
                secure: secure && !bogus,
                bogus,
                havedata: !data.is_empty(),
                data,
            })
        }
        // negative answers only reach here once their denial validated
        Answer::NoRecords { rcode } => DnssecResponse::ok(DnssecResult {
            rcode,
            secure: true,
            bogus: false,
            havedata: false,
            data: Vec::new(),
        }),
        Answer::Failed => DnssecResponse::failed(i32::from(RCODE_SERVFAIL)),
    }
}

fn rdata_bytes(data: &RData) -> Vec<u8> {
    match data {
        RData::TXT(txt) => txt.txt_data().concat(),
        other => other.to_string().into_bytes(),
    }
}

fn load_trust_anchors(path: &Path) -> Result<TrustAnchors> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Trust anchor is missing or inaccessible: {}: {}",
            path.display(),
            e
        ))
    })?;
    contents.parse::<TrustAnchors>().map_err(|e| {
        Error::Config(format!("invalid trust anchor {}: {}", path.display(), e))
    })
}
