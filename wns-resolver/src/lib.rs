//! Wallet name resolution
//!
//! Resolves a wallet name (`wallet.example.com` or `alias@example.com`) and a
//! currency code into a payment URI, an address, or data fetched from a
//! published endpoint. DNS answers are only used when DNSSEC validates them;
//! `.bit` names are resolved through Namecoin.
//!
//! Feature flag: `namecoin` (default on) enables the Namecoin RPC backend.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod lookup;
pub mod name;
pub mod resolver;

pub use config::{NamecoinSettings, ResolverConfig};
pub use decode::{FinalValue, PayloadInterpreter};
pub use endpoint::{EndpointClassification, EndpointGuard};
pub use error::{Backend, Error, ErrorCategory, Result};
pub use lookup::{DnssecLookup, NamecoinLookup, RecordSource};
pub use name::{preprocess, CanonicalLabel, CurrencyCode};
pub use resolver::{WalletNameResolver, WalletNameResolverBuilder};
