//! Error types for wallet name resolution
//!
//! Every per-call failure carries the name or label involved and, where it
//! matters, the currency and the backend that produced it.

use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Resolution backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// DNSSEC-validated DNS
    Dns,
    /// Namecoin blockchain names (`.bit`)
    Namecoin,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Dns => write!(f, "dns"),
            Backend::Namecoin => write!(f, "namecoin"),
        }
    }
}

/// Wallet name resolution errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or empty name/currency
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Query failed; retrying may succeed
    #[error("Lookup failed for {label} via {backend}: {reason}")]
    LookupFailed {
        /// Queried label
        label: String,
        /// Backend that failed
        backend: Backend,
        /// Failure detail
        reason: String,
    },

    /// DNSSEC chain of trust incomplete or validation failed
    #[error("Insecure DNSSEC result for {label}: {reason}")]
    InsecureResult {
        /// Queried label
        label: String,
        /// Which check failed
        reason: String,
    },

    /// Record payload could not be read as text
    #[error("Malformed record for {label}: {reason}")]
    MalformedRecord {
        /// Queried label
        label: String,
        /// Failure detail
        reason: String,
    },

    /// Currency not advertised for the name
    #[error("Currency {currency} unavailable for {name}")]
    CurrencyUnavailable {
        /// Wallet name
        name: String,
        /// Requested currency
        currency: String,
        /// Backend consulted
        backend: Backend,
    },

    /// Currency advertised but no address record published
    #[error("Wallet name {name} is misconfigured: {currency} is advertised but has no address")]
    WalletMisconfigured {
        /// Wallet name
        name: String,
        /// Advertised currency
        currency: String,
        /// Backend consulted
        backend: Backend,
    },

    /// Namecoin backend missing or not constructible
    #[error("Namecoin backend unavailable: {0}")]
    AlternateBackendUnavailable(String),

    /// Follow-up fetch of a resolved endpoint failed
    #[error("Resolution error fetching {url}: {reason}")]
    Resolution {
        /// Endpoint URL
        url: String,
        /// Failure detail
        reason: String,
    },

    /// Configuration error (trust anchor, config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LookupFailed { .. })
    }

    /// Backend the error originated from, when known
    pub fn backend(&self) -> Option<Backend> {
        match self {
            Error::LookupFailed { backend, .. }
            | Error::CurrencyUnavailable { backend, .. }
            | Error::WalletMisconfigured { backend, .. } => Some(*backend),
            Error::InsecureResult { .. } => Some(Backend::Dns),
            Error::AlternateBackendUnavailable(_) => Some(Backend::Namecoin),
            _ => None,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Error::LookupFailed { .. } => {
                "The wallet name lookup failed. Please try again.".to_string()
            }
            Error::InsecureResult { .. } => {
                "DNSSEC validation failed (chain of trust incomplete). The result cannot be trusted."
                    .to_string()
            }
            Error::CurrencyUnavailable { name, currency, .. } => {
                format!("Wallet name {} does not have an entry for currency {}.", name, currency)
            }
            Error::WalletMisconfigured { name, .. } => {
                format!("Wallet name {} is set up incorrectly.", name)
            }
            Error::AlternateBackendUnavailable(_) => {
                "Resolving .bit names requires a configured Namecoin node.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidArgument(_) => ErrorCategory::Argument,
            Error::LookupFailed { .. } => ErrorCategory::Lookup,
            Error::InsecureResult { .. } => ErrorCategory::Security,
            Error::MalformedRecord { .. }
            | Error::CurrencyUnavailable { .. }
            | Error::WalletMisconfigured { .. } => ErrorCategory::Record,
            Error::AlternateBackendUnavailable(_) => ErrorCategory::Backend,
            Error::Resolution { .. } => ErrorCategory::Fetch,
            Error::Config(_) | Error::Io(_) | Error::Serialization(_) => ErrorCategory::Config,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad caller input
    Argument,
    /// Transient lookup failure
    Lookup,
    /// Trust chain failure
    Security,
    /// Published record problem
    Record,
    /// Alternate backend missing
    Backend,
    /// Follow-up fetch failure
    Fetch,
    /// Configuration problem
    Config,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Argument => write!(f, "Argument"),
            ErrorCategory::Lookup => write!(f, "Lookup"),
            ErrorCategory::Security => write!(f, "Security"),
            ErrorCategory::Record => write!(f, "Record"),
            ErrorCategory::Backend => write!(f, "Backend"),
            ErrorCategory::Fetch => write!(f, "Fetch"),
            ErrorCategory::Config => write!(f, "Config"),
        }
    }
}
