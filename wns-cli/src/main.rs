//! Command-line wallet name resolver
//!
//! With a currency, resolves the wallet name and prints the final value.
//! Without one, prints the currencies the name advertises.

use anyhow::bail;
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use wns_net::DnsProvider;
use wns_resolver::{Error, NamecoinSettings, ResolverConfig, WalletNameResolver};

#[derive(Parser)]
#[command(name = "wns-cli")]
#[command(about = "Resolve wallet names to payment addresses", long_about = None)]
struct Cli {
    /// Wallet name, e.g. wallet.example.com or alias@example.com
    name: String,

    /// Currency code, e.g. btc; lists available currencies when omitted
    currency: Option<String>,

    /// Attempts made when the lookup itself fails
    #[arg(short, long, default_value = "3")]
    retries: u32,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// resolv.conf used to find the system resolver
    #[arg(long)]
    resolv_conf: Option<PathBuf>,

    /// DNSSEC trust anchor file
    #[arg(long)]
    trust_anchor: Option<PathBuf>,

    /// Upstream resolver: system, cloudflare, quad9, google or comma-separated nameserver IPs
    #[arg(long, value_parser = parse_provider)]
    dns_provider: Option<DnsProvider>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Namecoin node host, enables .bit names
    #[arg(long)]
    namecoin_host: Option<String>,

    /// Namecoin node RPC port
    #[arg(long)]
    namecoin_port: Option<u16>,

    /// Namecoin RPC user
    #[arg(long, requires = "namecoin_password")]
    namecoin_user: Option<String>,

    /// Namecoin RPC password
    #[arg(long, requires = "namecoin_user")]
    namecoin_password: Option<String>,

    /// Directory holding the Namecoin node's .cookie file
    #[arg(long)]
    namecoin_tmpdir: Option<PathBuf>,
}

fn parse_provider(value: &str) -> Result<DnsProvider, String> {
    match value {
        "system" => Ok(DnsProvider::System),
        "cloudflare" => Ok(DnsProvider::CloudflareDoH),
        "quad9" => Ok(DnsProvider::Quad9DoH),
        "google" => Ok(DnsProvider::GoogleDoH),
        list => list
            .split(',')
            .map(|ip| ip.trim().parse::<IpAddr>())
            .collect::<Result<Vec<_>, _>>()
            .map(DnsProvider::Custom)
            .map_err(|_| {
                format!(
                    "unknown provider '{}' (expected system, cloudflare, quad9, google or nameserver IPs)",
                    list
                )
            }),
    }
}

impl Cli {
    fn resolver_config(&self) -> anyhow::Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::load(path)?,
            None => ResolverConfig::default(),
        };

        if let Some(path) = &self.resolv_conf {
            config = config.with_resolv_conf(path);
        }
        if let Some(path) = &self.trust_anchor {
            config = config.with_trust_anchor(path);
        }
        if let Some(provider) = &self.dns_provider {
            config = config.with_dns_provider(provider.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        if self.has_namecoin_flags() {
            let mut settings = match (&self.namecoin_host, config.namecoin.clone()) {
                (Some(host), Some(existing)) => NamecoinSettings {
                    host: host.clone(),
                    ..existing
                },
                (Some(host), None) => NamecoinSettings::new(host.as_str()),
                (None, Some(existing)) => existing,
                (None, None) => {
                    bail!("--namecoin-host is required when the configuration names no Namecoin node")
                }
            };
            if let Some(port) = self.namecoin_port {
                settings = settings.with_port(port);
            }
            if let (Some(user), Some(password)) = (&self.namecoin_user, &self.namecoin_password) {
                settings = settings.with_credentials(user.as_str(), password.as_str());
            }
            if let Some(dir) = &self.namecoin_tmpdir {
                settings = settings.with_temp_dir(dir);
            }
            config = config.with_namecoin(settings);
        }

        Ok(config)
    }

    fn has_namecoin_flags(&self) -> bool {
        self.namecoin_host.is_some()
            || self.namecoin_port.is_some()
            || self.namecoin_user.is_some()
            || self.namecoin_tmpdir.is_some()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolver_config()?;

    let resolver = match WalletNameResolver::new(config) {
        Ok(resolver) => resolver,
        Err(e) => {
            warn!("Resolver setup failed [{}]: {}", e.category(), e);
            println!("{}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    let resolved = match &cli.currency {
        Some(currency) => resolve(&resolver, &cli.name, currency, cli.retries).await,
        None => list(&resolver, &cli.name, cli.retries).await,
    };

    if resolved {
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Unable to resolve Wallet Name [{}]", cli.name);
        Ok(ExitCode::FAILURE)
    }
}

async fn resolve(resolver: &WalletNameResolver, name: &str, currency: &str, retries: u32) -> bool {
    for attempt in 1..=retries.max(1) {
        match resolver.resolve(name, currency).await {
            Ok(Some(value)) => {
                println!(
                    "Wallet Name [{}] resolved address {} [CURRENCY: {}]",
                    name, value, currency
                );
                return true;
            }
            Ok(None) => {
                println!("Wallet Name [{}] does not publish a currency list", name);
                return false;
            }
            Err(e) if e.is_retryable() => {
                info!("Attempt {} failed: {}", attempt, e);
                println!("Wallet Name [{}] resolution failed, retrying.", name);
            }
            Err(e) => {
                report(name, &e);
                return false;
            }
        }
    }
    false
}

async fn list(resolver: &WalletNameResolver, name: &str, retries: u32) -> bool {
    for attempt in 1..=retries.max(1) {
        match resolver.list_currencies(name).await {
            Ok(Some(currencies)) => {
                let codes: Vec<&str> = currencies.iter().map(|c| c.as_str()).collect();
                println!("Wallet Name [{}] currencies: {}", name, codes.join(" "));
                return true;
            }
            Ok(None) => {
                println!("Wallet Name [{}] does not publish a currency list", name);
                return false;
            }
            Err(e) if e.is_retryable() => {
                info!("Attempt {} failed: {}", attempt, e);
                println!("Wallet Name [{}] resolution failed, retrying.", name);
            }
            Err(e) => {
                report(name, &e);
                return false;
            }
        }
    }
    false
}

fn report(name: &str, error: &Error) {
    warn!("Wallet Name [{}] failed [{}]: {}", name, error.category(), error);
    match error {
        Error::InsecureResult { .. } => println!(
            "Wallet Name [{}] DNSSEC resolution is insecure (chain of trust incomplete)",
            name
        ),
        Error::AlternateBackendUnavailable(_) => println!(
            "Wallet Name [{}] requires a Namecoin node; pass --namecoin-host to resolve it",
            name
        ),
        _ => println!("Wallet Name [{}]: {}", name, error.user_message()),
    }
}
