//! Wallet name normalization
//!
//! Email-shaped aliases (`local@example.com`) are queried as
//! `sha224(local).example.com`. Plain domain names are queried as given.

use crate::{Backend, Error, Result};
use sha2::{Digest, Sha224};
use std::fmt;

/// Top-level label served by the Namecoin backend
pub const NAMECOIN_TLD: &str = "bit";

/// Label under which a name publishes its currency list
pub const WALLET_LABEL: &str = "_wallet";

/// DNS label actually queried for a wallet name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalLabel(String);

impl CanonicalLabel {
    /// Label as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backend responsible for this label
    pub fn backend(&self) -> Backend {
        let tld = self.0.trim_end_matches('.').rsplit('.').next().unwrap_or("");
        if tld.eq_ignore_ascii_case(NAMECOIN_TLD) {
            Backend::Namecoin
        } else {
            Backend::Dns
        }
    }

    /// `_wallet.<label>`
    pub fn currency_list_label(&self) -> String {
        format!("{}.{}", WALLET_LABEL, self.0)
    }

    /// `_<currency>._wallet.<label>`
    pub fn currency_label(&self, currency: &CurrencyCode) -> String {
        format!("_{}.{}.{}", currency.as_str(), WALLET_LABEL, self.0)
    }
}

impl fmt::Display for CanonicalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Currency token such as `btc`, always lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code; fails with `InvalidArgument` when empty
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::InvalidArgument("currency is required".to_string()));
        }
        if code.contains(|c: char| c.is_whitespace() || c == '.') {
            return Err(Error::InvalidArgument(format!(
                "invalid currency code: {}",
                code
            )));
        }
        Ok(Self(code.to_ascii_lowercase()))
    }

    /// Code as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a space-separated currency list, keeping published order
    pub fn parse_list(list: &str) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = Vec::new();
        for token in list.split_ascii_whitespace() {
            if let Ok(code) = CurrencyCode::new(token) {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
        }
        codes
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a wallet name into the label to query.
///
/// Only the first `@` separates the local part; later `@` characters stay in
/// the domain remainder.
pub fn preprocess(name: &str) -> Result<CanonicalLabel> {
    if name.trim().is_empty() {
        return Err(Error::InvalidArgument("wallet name is required".to_string()));
    }

    match name.split_once('@') {
        Some((_, rest)) if rest.trim_end_matches('.').is_empty() => Err(Error::InvalidArgument(
            format!("wallet name {} has no domain after '@'", name),
        )),
        Some((local, rest)) => Ok(CanonicalLabel(format!(
            "{}.{}",
            hash_local_part(local),
            rest
        ))),
        None => Ok(CanonicalLabel(name.to_string())),
    }
}

/// Hex-encoded SHA-224 of the local part (56 characters)
pub fn hash_local_part(local: &str) -> String {
    hex::encode(Sha224::digest(local.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WALLET_HASH: &str = "9e9285c79443cf2c0f868b0216308fb0e3ffeb45ade2c10ac67147f5";

    #[test]
    fn test_no_change() {
        let label = preprocess("wallet.domain.com").unwrap();
        assert_eq!(label.as_str(), "wallet.domain.com");
    }

    #[test]
    fn test_email_walletname() {
        let label = preprocess("wallet@domain.com").unwrap();
        assert_eq!(label.as_str(), format!("{}.domain.com", WALLET_HASH));
    }

    #[test]
    fn test_email_with_multiple_at_signs() {
        let label = preprocess("wallet@wallet@domain.com").unwrap();
        assert_eq!(label.as_str(), format!("{}.wallet@domain.com", WALLET_HASH));
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(preprocess(""), Err(Error::InvalidArgument(_))));
        assert!(matches!(preprocess("   "), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_preprocess_rejects_missing_domain() {
        for name in ["alias@", "alias@.", "alias@..", "@"] {
            assert!(
                matches!(preprocess(name), Err(Error::InvalidArgument(_))),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_backend_selection() {
        assert_eq!(
            preprocess("wallet.mattdavid.bit").unwrap().backend(),
            Backend::Namecoin
        );
        assert_eq!(
            preprocess("wallet.mattdavid.BIT.").unwrap().backend(),
            Backend::Namecoin
        );
        assert_eq!(
            preprocess("wallet.mattdavid.xyz").unwrap().backend(),
            Backend::Dns
        );
        assert_eq!(
            preprocess("wallet.bit.example.com").unwrap().backend(),
            Backend::Dns
        );
        assert_eq!(
            preprocess("wallet@mattdavid.bit").unwrap().backend(),
            Backend::Namecoin
        );
    }

    #[test]
    fn test_record_labels() {
        let label = preprocess("wallet@mattdavid.xyz").unwrap();
        let btc = CurrencyCode::new("BTC").unwrap();

        assert_eq!(
            label.currency_list_label(),
            format!("_wallet.{}.mattdavid.xyz", WALLET_HASH)
        );
        assert_eq!(
            label.currency_label(&btc),
            format!("_btc._wallet.{}.mattdavid.xyz", WALLET_HASH)
        );
    }

    #[test]
    fn test_parse_currency_list() {
        let codes = CurrencyCode::parse_list("btc  ltc\tdgc BTC");
        let codes: Vec<&str> = codes.iter().map(CurrencyCode::as_str).collect();
        assert_eq!(codes, vec!["btc", "ltc", "dgc"]);

        assert!(CurrencyCode::parse_list("").is_empty());
    }

    #[test]
    fn test_currency_code_validation() {
        assert!(matches!(
            CurrencyCode::new(""),
            Err(Error::InvalidArgument(_))
        ));
        assert!(CurrencyCode::new("b tc").is_err());
        assert!(CurrencyCode::new("_x._wallet").is_err());
        assert_eq!(CurrencyCode::new(" LTC ").unwrap().as_str(), "ltc");
    }

    proptest! {
        #[test]
        fn prop_plain_names_unchanged(name in "[a-z0-9][a-z0-9.-]{0,60}") {
            let label = preprocess(&name).unwrap();
            prop_assert_eq!(label.as_str(), name.as_str());
        }

        #[test]
        fn prop_splits_on_first_at(
            local in "[a-z0-9._+-]{1,20}",
            rest in "[a-z0-9][a-z0-9@.-]{0,39}",
        ) {
            let name = format!("{}@{}", local, rest);
            let label = preprocess(&name).unwrap();
            let expected = format!("{}.{}", hash_local_part(&local), rest);

            prop_assert_eq!(label.as_str(), expected.as_str());
            prop_assert_eq!(hash_local_part(&local).len(), 56);
        }
    }
}
