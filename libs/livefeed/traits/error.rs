use thiserror::Error;

/// Main error type for the live-feed client
#[derive(Error, Debug)]
pub enum FeedError {
    /// Inbound message failed normalization
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// Connection-level failure (refused, reset, handshake failure)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Connection closed unexpectedly
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Retry budget exhausted without an intervening successful open
    #[error("Retry budget exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// Channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Result type for live-feed operations
pub type Result<T> = std::result::Result<T, FeedError>;
