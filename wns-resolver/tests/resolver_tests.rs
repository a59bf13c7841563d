//! End-to-end resolution tests
//!
//! Drives `WalletNameResolver` against in-memory DNS, Namecoin, hostname and
//! HTTP collaborators and checks which of them each call touches.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use wns_net::{
    DnssecClient, DnssecResponse, DnssecResult, HostResolver, HttpFetcher, NamecoinClient,
    RecordType,
};
use wns_resolver::{
    Backend, Error, FinalValue, ResolverConfig, WalletNameResolver,
};

const WALLET_HASH: &str = "9e9285c79443cf2c0f868b0216308fb0e3ffeb45ade2c10ac67147f5";

// ============================================================================
// Collaborator doubles
// ============================================================================

#[derive(Default)]
struct MockDns {
    records: HashMap<String, DnssecResponse>,
    queries: Mutex<Vec<String>>,
}

impl MockDns {
    fn with_txt(mut self, label: &str, value: &str) -> Self {
        self.records.insert(
            label.to_string(),
            DnssecResponse::ok(DnssecResult {
                rcode: 0,
                secure: true,
                bogus: false,
                havedata: true,
                data: vec![value.as_bytes().to_vec()],
            }),
        );
        self
    }

    fn with_response(mut self, label: &str, response: DnssecResponse) -> Self {
        self.records.insert(label.to_string(), response);
        self
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnssecClient for MockDns {
    async fn query(&self, name: &str, record_type: RecordType) -> wns_net::Result<DnssecResponse> {
        assert_eq!(record_type, RecordType::Txt);
        self.queries.lock().unwrap().push(name.to_string());
        Ok(self.records.get(name).cloned().unwrap_or_else(|| {
            DnssecResponse::ok(DnssecResult {
                rcode: 3,
                secure: true,
                bogus: false,
                havedata: false,
                data: Vec::new(),
            })
        }))
    }
}

#[derive(Default)]
struct MockNamecoin {
    records: HashMap<String, String>,
    queries: Mutex<Vec<String>>,
}

impl MockNamecoin {
    fn with_txt(mut self, label: &str, value: &str) -> Self {
        self.records.insert(label.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl NamecoinClient for MockNamecoin {
    async fn resolve(&self, label: &str) -> wns_net::Result<Option<String>> {
        self.queries.lock().unwrap().push(label.to_string());
        Ok(self.records.get(label).cloned())
    }
}

struct MockHosts(HashMap<&'static str, IpAddr>);

impl Default for MockHosts {
    fn default() -> Self {
        let mut hosts = HashMap::new();
        hosts.insert("lookup.example", "93.184.215.14".parse().unwrap());
        hosts.insert("internal.example", "10.1.2.3".parse().unwrap());
        Self(hosts)
    }
}

#[async_trait]
impl HostResolver for MockHosts {
    async fn lookup(&self, host: &str) -> wns_net::Result<Vec<IpAddr>> {
        self.0
            .get(host)
            .map(|ip| vec![*ip])
            .ok_or_else(|| wns_net::Error::Dns(format!("{}: Name or service not known", host)))
    }
}

#[derive(Default)]
struct MockHttp {
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MockHttp {
    fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetcher for MockHttp {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> wns_net::Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.to_vec()));
        Ok("payment request body".to_string())
    }
}

struct Harness {
    resolver: WalletNameResolver,
    dns: Arc<MockDns>,
    namecoin: Arc<MockNamecoin>,
    http: Arc<MockHttp>,
    _anchor: NamedTempFile,
}

fn harness(dns: MockDns, namecoin: MockNamecoin) -> Harness {
    let anchor = NamedTempFile::new().unwrap();
    let dns = Arc::new(dns);
    let namecoin = Arc::new(namecoin);
    let http = Arc::new(MockHttp::default());

    let resolver = WalletNameResolver::builder(
        ResolverConfig::default().with_trust_anchor(anchor.path()),
    )
    .dnssec_client(dns.clone())
    .namecoin_client(namecoin.clone())
    .host_resolver(Arc::new(MockHosts::default()))
    .http_fetcher(http.clone())
    .build()
    .unwrap();

    Harness {
        resolver,
        dns,
        namecoin,
        http,
        _anchor: anchor,
    }
}

fn wallet_x() -> MockDns {
    MockDns::default().with_txt("_wallet.x", "btc ltc dgc")
}

// ============================================================================
// list_currencies
// ============================================================================

#[tokio::test]
async fn test_list_currencies() {
    let h = harness(wallet_x(), MockNamecoin::default());

    let currencies = h.resolver.list_currencies("x").await.unwrap().unwrap();
    let codes: Vec<&str> = currencies.iter().map(|c| c.as_str()).collect();

    assert_eq!(codes, vec!["btc", "ltc", "dgc"]);
    assert_eq!(h.dns.queries(), vec!["_wallet.x"]);
}

#[tokio::test]
async fn test_list_currencies_email_format() {
    let label = format!("_wallet.{}.mattdavid.xyz", WALLET_HASH);
    let h = harness(
        MockDns::default().with_txt(&label, "btc ltc dgc"),
        MockNamecoin::default(),
    );

    let currencies = h
        .resolver
        .list_currencies("wallet@mattdavid.xyz")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(currencies.len(), 3);
    assert_eq!(h.dns.queries(), vec![label]);
}

#[tokio::test]
async fn test_list_currencies_no_name() {
    let h = harness(wallet_x(), MockNamecoin::default());

    let err = h.resolver.list_currencies("").await.unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(h.dns.queries().is_empty());
}

#[tokio::test]
async fn test_list_currencies_absent_record() {
    let h = harness(MockDns::default(), MockNamecoin::default());

    assert!(h.resolver.list_currencies("x").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_currencies_namecoin() {
    let h = harness(
        MockDns::default(),
        MockNamecoin::default().with_txt("_wallet.wallet.mattdavid.bit", "btc ltc dgc"),
    );

    let currencies = h
        .resolver
        .list_currencies("wallet.mattdavid.bit")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(currencies.len(), 3);
    assert_eq!(
        *h.namecoin.queries.lock().unwrap(),
        vec!["_wallet.wallet.mattdavid.bit"]
    );
    assert!(h.dns.queries().is_empty());
}

// ============================================================================
// resolve
// ============================================================================

#[tokio::test]
async fn test_resolve_raw_address() {
    let h = harness(
        wallet_x().with_txt("_btc._wallet.x", "1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3"),
        MockNamecoin::default(),
    );

    let value = h.resolver.resolve("x", "btc").await.unwrap().unwrap();

    assert_eq!(value, FinalValue::Literal("1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3".to_string()));
    assert_eq!(h.dns.queries(), vec!["_wallet.x", "_btc._wallet.x"]);
    assert!(h.namecoin.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_resolve_email_format() {
    let list_label = format!("_wallet.{}.mattdavid.xyz", WALLET_HASH);
    let btc_label = format!("_btc._wallet.{}.mattdavid.xyz", WALLET_HASH);
    let h = harness(
        MockDns::default()
            .with_txt(&list_label, "btc")
            .with_txt(&btc_label, "1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3"),
        MockNamecoin::default(),
    );

    let value = h
        .resolver
        .resolve("wallet@mattdavid.xyz", "btc")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value.as_str(), "1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3");
    assert_eq!(h.dns.queries(), vec![list_label, btc_label]);
}

#[tokio::test]
async fn test_resolve_base64_payment_uri_is_terminal() {
    // base64("bitcoin:?r=https://merchant.example/pay")
    let h = harness(
        wallet_x().with_txt(
            "_btc._wallet.x",
            "Yml0Y29pbjo/cj1odHRwczovL21lcmNoYW50LmV4YW1wbGUvcGF5",
        ),
        MockNamecoin::default(),
    );

    let value = h.resolver.resolve("x", "btc").await.unwrap().unwrap();

    assert_eq!(value.as_str(), "bitcoin:?r=https://merchant.example/pay");
    assert!(h.http.requests().is_empty());
}

#[tokio::test]
async fn test_resolve_fetches_public_endpoint() {
    // base64("https://lookup.example/pr/uuid")
    let h = harness(
        wallet_x().with_txt("_btc._wallet.x", "aHR0cHM6Ly9sb29rdXAuZXhhbXBsZS9wci91dWlk"),
        MockNamecoin::default(),
    );
    let client_ip: IpAddr = "8.8.8.8".parse().unwrap();

    let value = h
        .resolver
        .resolve_for_client("x", "btc", Some(client_ip))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value, FinalValue::Fetched("payment request body".to_string()));
    assert_eq!(
        h.http.requests(),
        vec![(
            "https://lookup.example/pr/uuid".to_string(),
            vec![("X-Forwarded-For".to_string(), "8.8.8.8".to_string())]
        )]
    );
}

#[tokio::test]
async fn test_resolve_private_endpoint_returned_literally() {
    // base64("https://internal.example/pr/uuid")
    let h = harness(
        wallet_x().with_txt("_btc._wallet.x", "aHR0cHM6Ly9pbnRlcm5hbC5leGFtcGxlL3ByL3V1aWQ="),
        MockNamecoin::default(),
    );

    let value = h.resolver.resolve("x", "btc").await.unwrap().unwrap();

    assert_eq!(
        value,
        FinalValue::Literal("https://internal.example/pr/uuid".to_string())
    );
    assert!(h.http.requests().is_empty());
}

#[tokio::test]
async fn test_resolve_no_name() {
    let h = harness(wallet_x(), MockNamecoin::default());

    let err = h.resolver.resolve("", "btc").await.unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(h.dns.queries().is_empty());
}

#[tokio::test]
async fn test_resolve_email_without_domain() {
    let h = harness(wallet_x(), MockNamecoin::default());

    let err = h.resolver.resolve("alias@", "btc").await.unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(h.dns.queries().is_empty());
}

#[tokio::test]
async fn test_resolve_no_currency() {
    let h = harness(wallet_x(), MockNamecoin::default());

    let err = h.resolver.resolve("x", "").await.unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(h.dns.queries().is_empty());
}

#[tokio::test]
async fn test_resolve_currency_not_listed() {
    let h = harness(
        MockDns::default().with_txt("_wallet.x", "btc"),
        MockNamecoin::default(),
    );

    let err = h.resolver.resolve("x", "dgc").await.unwrap_err();

    match err {
        Error::CurrencyUnavailable {
            name,
            currency,
            backend,
        } => {
            assert_eq!(name, "x");
            assert_eq!(currency, "dgc");
            assert_eq!(backend, Backend::Dns);
        }
        other => panic!("expected CurrencyUnavailable, got {:?}", other),
    }
    assert_eq!(h.dns.queries(), vec!["_wallet.x"]);
}

#[tokio::test]
async fn test_resolve_currency_case_insensitive() {
    let h = harness(
        wallet_x().with_txt("_btc._wallet.x", "1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3"),
        MockNamecoin::default(),
    );

    let value = h.resolver.resolve("x", "BTC").await.unwrap().unwrap();
    assert_eq!(value.as_str(), "1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3");
}

#[tokio::test]
async fn test_resolve_wallet_misconfigured() {
    let h = harness(wallet_x(), MockNamecoin::default());

    let err = h.resolver.resolve("x", "ltc").await.unwrap_err();

    assert!(matches!(err, Error::WalletMisconfigured { .. }));
    assert_eq!(h.dns.queries(), vec!["_wallet.x", "_ltc._wallet.x"]);
}

#[tokio::test]
async fn test_resolve_no_currency_list_is_absent() {
    let h = harness(MockDns::default(), MockNamecoin::default());

    assert!(h.resolver.resolve("x", "btc").await.unwrap().is_none());
    assert_eq!(h.dns.queries(), vec!["_wallet.x"]);
}

#[tokio::test]
async fn test_resolve_insecure_currency_list() {
    let h = harness(
        MockDns::default().with_response(
            "_wallet.x",
            DnssecResponse::ok(DnssecResult {
                rcode: 0,
                secure: false,
                bogus: false,
                havedata: true,
                data: vec![b"btc".to_vec()],
            }),
        ),
        MockNamecoin::default(),
    );

    let err = h.resolver.resolve("x", "btc").await.unwrap_err();

    assert!(matches!(err, Error::InsecureResult { .. }));
    assert!(!err.is_retryable());
    assert_eq!(h.dns.queries(), vec!["_wallet.x"]);
}

#[tokio::test]
async fn test_resolve_bogus_address_record() {
    let h = harness(
        wallet_x().with_response(
            "_btc._wallet.x",
            DnssecResponse::ok(DnssecResult {
                rcode: 2,
                secure: true,
                bogus: true,
                havedata: true,
                data: vec![b"1AttackerAddress".to_vec()],
            }),
        ),
        MockNamecoin::default(),
    );

    let err = h.resolver.resolve("x", "btc").await.unwrap_err();
    assert!(matches!(err, Error::InsecureResult { .. }));
}

#[tokio::test]
async fn test_resolve_lookup_failure_is_retryable() {
    let h = harness(
        MockDns::default().with_response("_wallet.x", DnssecResponse::failed(2)),
        MockNamecoin::default(),
    );

    let err = h.resolver.resolve("x", "btc").await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_resolve_namecoin() {
    let h = harness(
        MockDns::default(),
        MockNamecoin::default()
            .with_txt("_wallet.wallet.mattdavid.bit", "btc")
            .with_txt("_btc._wallet.wallet.mattdavid.bit", "1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3"),
    );

    let value = h
        .resolver
        .resolve("wallet.mattdavid.bit", "btc")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value.as_str(), "1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3");
    assert_eq!(h.namecoin.queries.lock().unwrap().len(), 2);
    assert!(h.dns.queries().is_empty());
}

#[tokio::test]
async fn test_resolve_namecoin_misconfigured_reports_backend() {
    let h = harness(
        MockDns::default(),
        MockNamecoin::default().with_txt("_wallet.wallet.mattdavid.bit", "btc"),
    );

    let err = h
        .resolver
        .resolve("wallet.mattdavid.bit", "btc")
        .await
        .unwrap_err();

    assert_eq!(err.backend(), Some(Backend::Namecoin));
    assert!(matches!(err, Error::WalletMisconfigured { .. }));
}

#[tokio::test]
async fn test_namecoin_unavailable() {
    let anchor = NamedTempFile::new().unwrap();
    let dns = Arc::new(MockDns::default());
    let resolver =
        WalletNameResolver::builder(ResolverConfig::default().with_trust_anchor(anchor.path()))
            .dnssec_client(dns.clone())
            .host_resolver(Arc::new(MockHosts::default()))
            .http_fetcher(Arc::new(MockHttp::default()))
            .build()
            .unwrap();

    let err = resolver
        .resolve("wallet.mattdavid.bit", "btc")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlternateBackendUnavailable(_)));

    let err = resolver
        .list_currencies("wallet.mattdavid.bit")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlternateBackendUnavailable(_)));
    assert!(dns.queries().is_empty());
}

#[tokio::test]
async fn test_trust_anchor_missing_fails_before_query() {
    let dns = Arc::new(wallet_x());

    let result =
        WalletNameResolver::builder(ResolverConfig::default().with_trust_anchor("/nonexistent/root.key"))
            .dnssec_client(dns.clone())
            .build();

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("Trust anchor is missing or inaccessible")),
        _ => panic!("expected configuration error"),
    }
    assert!(dns.queries().is_empty());
}

#[tokio::test]
async fn test_concurrent_calls_share_resolver() {
    let h = harness(
        wallet_x().with_txt("_btc._wallet.x", "1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3"),
        MockNamecoin::default(),
    );
    let resolver = Arc::new(h.resolver);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let resolver = resolver.clone();
        handles.push(tokio::spawn(async move {
            resolver.resolve("x", "btc").await.unwrap().unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().as_str(), "1MSK1PMnDZN4SLDQ6gB4c6GKRExfGD6Gb3");
    }
    assert_eq!(h.dns.queries().len(), 16);
}
