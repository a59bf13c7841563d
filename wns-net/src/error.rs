//! Error types

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// DNS error
    #[error("DNS error: {0}")]
    Dns(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Namecoin RPC error
    #[error("Namecoin error: {0}")]
    Namecoin(String),

    /// Collaborator configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
