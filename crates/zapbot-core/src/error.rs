use thiserror::Error;

/// Top-level error type for zapbot.
#[derive(Debug, Error)]
pub enum ZapError {
    /// Error from an AI provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// The AI provider refused the request for quota or rate reasons.
    #[error("provider rate limited: {0}")]
    RateLimited(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Statistics persistence error.
    #[error("stats error: {0}")]
    Stats(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
