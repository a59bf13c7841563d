//! Wallet name resolution.
//!
//! Both operations start by reading the currency list a name publishes at
//! `_wallet.<label>`. Resolving a currency then reads
//! `_<currency>._wallet.<label>` and passes its payload through the decode
//! chain. Names under `.bit` are served by Namecoin, everything else by
//! DNSSEC-validated DNS.

use crate::config::ResolverConfig;
use crate::decode::{FinalValue, PayloadInterpreter};
use crate::endpoint::EndpointGuard;
use crate::lookup::{ensure_trust_anchor, DnssecLookup, NamecoinLookup, RecordSource};
use crate::name::{preprocess, CanonicalLabel, CurrencyCode};
use crate::{Backend, Error, Result};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};
use wns_net::{
    DnssecClient, HickoryDnssecClient, HostResolver, HttpFetcher, NamecoinClient, NamecoinConfig,
    ReqwestFetcher, SystemResolver,
};

/// Resolves wallet names to payment endpoints
pub struct WalletNameResolver {
    config: ResolverConfig,
    dns: DnssecLookup,
    namecoin: NamecoinLookup,
    interpreter: PayloadInterpreter,
}

#[allow(dead_code)]
fn _assert_resolver_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WalletNameResolver>();
}

impl WalletNameResolver {
    /// Create a resolver with the production collaborators
    pub fn new(config: ResolverConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a resolver, optionally overriding collaborators
    pub fn builder(config: ResolverConfig) -> WalletNameResolverBuilder {
        WalletNameResolverBuilder {
            config,
            dnssec: None,
            hosts: None,
            http: None,
            namecoin: None,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Whether `.bit` names can be resolved
    pub fn namecoin_available(&self) -> bool {
        self.namecoin.is_available()
    }

    /// List the currencies `name` advertises, in published order.
    ///
    /// Returns `Ok(None)` when the name publishes no currency list.
    pub async fn list_currencies(&self, name: &str) -> Result<Option<Vec<CurrencyCode>>> {
        let label = preprocess(name)?;
        let source = self.source_for(&label);
        self.fetch_currencies(&label, source).await
    }

    /// Resolve `name` for `currency` to its final value.
    ///
    /// Returns `Ok(None)` when the name publishes no currency list.
    pub async fn resolve(&self, name: &str, currency: &str) -> Result<Option<FinalValue>> {
        self.resolve_for_client(name, currency, None).await
    }

    /// Like [`resolve`](Self::resolve), forwarding `client_ip` as
    /// `X-Forwarded-For` on any follow-up fetch
    pub async fn resolve_for_client(
        &self,
        name: &str,
        currency: &str,
        client_ip: Option<IpAddr>,
    ) -> Result<Option<FinalValue>> {
        let label = preprocess(name)?;
        let currency = CurrencyCode::new(currency)?;
        let source = self.source_for(&label);
        let backend = source.backend();

        let Some(currencies) = self.fetch_currencies(&label, source).await? else {
            info!("Wallet name {} has no currency list", name);
            return Ok(None);
        };

        if !currencies.contains(&currency) {
            return Err(Error::CurrencyUnavailable {
                name: name.to_string(),
                currency: currency.to_string(),
                backend,
            });
        }

        let Some(payload) = source.lookup(&label.currency_label(&currency)).await? else {
            return Err(Error::WalletMisconfigured {
                name: name.to_string(),
                currency: currency.to_string(),
                backend,
            });
        };

        let value = self.interpreter.interpret_payload(&payload, client_ip).await?;
        info!("Resolved wallet name {} [{}] via {}", name, currency, backend);

        Ok(Some(value))
    }

    async fn fetch_currencies(
        &self,
        label: &CanonicalLabel,
        source: &dyn RecordSource,
    ) -> Result<Option<Vec<CurrencyCode>>> {
        let record = source.lookup(&label.currency_list_label()).await?;
        debug!("Currency list for {}: {:?}", label, record);
        Ok(record.map(|list| CurrencyCode::parse_list(&list)))
    }

    fn source_for(&self, label: &CanonicalLabel) -> &dyn RecordSource {
        match label.backend() {
            Backend::Dns => &self.dns,
            Backend::Namecoin => &self.namecoin,
        }
    }
}

/// Builder for [`WalletNameResolver`]
pub struct WalletNameResolverBuilder {
    config: ResolverConfig,
    dnssec: Option<Arc<dyn DnssecClient>>,
    hosts: Option<Arc<dyn HostResolver>>,
    http: Option<Arc<dyn HttpFetcher>>,
    namecoin: Option<Arc<dyn NamecoinClient>>,
}

impl WalletNameResolverBuilder {
    /// Use `client` for DNSSEC queries
    pub fn dnssec_client(mut self, client: Arc<dyn DnssecClient>) -> Self {
        self.dnssec = Some(client);
        self
    }

    /// Use `hosts` to resolve endpoint hostnames
    pub fn host_resolver(mut self, hosts: Arc<dyn HostResolver>) -> Self {
        self.hosts = Some(hosts);
        self
    }

    /// Use `http` for follow-up fetches
    pub fn http_fetcher(mut self, http: Arc<dyn HttpFetcher>) -> Self {
        self.http = Some(http);
        self
    }

    /// Use `client` for `.bit` names
    pub fn namecoin_client(mut self, client: Arc<dyn NamecoinClient>) -> Self {
        self.namecoin = Some(client);
        self
    }

    /// Build the resolver.
    ///
    /// Fails with `Error::Config` when the trust anchor is missing, before
    /// anything touches the network, and with `AlternateBackendUnavailable`
    /// when Namecoin settings are present but no client can be built.
    pub fn build(self) -> Result<WalletNameResolver> {
        let config = self.config;
        ensure_trust_anchor(&config.trust_anchor)?;

        let dnssec: Arc<dyn DnssecClient> = match self.dnssec {
            Some(client) => client,
            None => Arc::new(
                HickoryDnssecClient::new(&config.dns_config())
                    .map_err(|e| Error::Config(e.to_string()))?,
            ),
        };
        let hosts: Arc<dyn HostResolver> = match self.hosts {
            Some(hosts) => hosts,
            None => Arc::new(SystemResolver::new()),
        };
        let http: Arc<dyn HttpFetcher> = match self.http {
            Some(http) => http,
            None => Arc::new(
                ReqwestFetcher::new(&config.http_config())
                    .map_err(|e| Error::Config(e.to_string()))?,
            ),
        };
        let namecoin = match (self.namecoin, config.namecoin_config()) {
            (Some(client), _) => Some(client),
            (None, Some(settings)) => Some(connect_namecoin(&settings)?),
            (None, None) => None,
        };

        info!(
            "Creating wallet name resolver: trust_anchor={} namecoin={}",
            config.trust_anchor.display(),
            namecoin.is_some()
        );

        Ok(WalletNameResolver {
            dns: DnssecLookup::new(dnssec, config.trust_anchor.clone())?,
            namecoin: NamecoinLookup::new(namecoin),
            interpreter: PayloadInterpreter::new(EndpointGuard::new(hosts), http),
            config,
        })
    }
}

#[cfg(feature = "namecoin")]
fn connect_namecoin(config: &NamecoinConfig) -> Result<Arc<dyn NamecoinClient>> {
    let client = wns_net::NamecoinRpcClient::new(config)
        .map_err(|e| Error::AlternateBackendUnavailable(e.to_string()))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "namecoin"))]
fn connect_namecoin(config: &NamecoinConfig) -> Result<Arc<dyn NamecoinClient>> {
    Err(Error::AlternateBackendUnavailable(format!(
        "built without the `namecoin` feature; cannot use node {}:{}",
        config.host, config.port
    )))
}
