/*
[INPUT]:  Error sources (validation, admission, transport, serialization, config)
[OUTPUT]: Structured error type shared by both feeds
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the Bitfinex adapter
#[derive(Error, Debug)]
pub enum BitfinexError {
    /// A command is missing required fields or carries invalid values
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Subscription admission past the concurrent-channel limit
    #[error("Only {limit} concurrent channels are supported")]
    CapacityExceeded { limit: usize },

    /// The transport refused a write or failed to connect
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport is not open yet (or is reconnecting)
    #[error("WebSocket not connected")]
    NotConnected,

    /// The component was closed and will not reconnect
    #[error("Connection closed permanently")]
    Closed,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BitfinexError {
    /// Check if the same call may succeed later without changing its input
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BitfinexError::Transport(_) | BitfinexError::NotConnected
        )
    }

    /// Check if the error was raised before anything reached the network
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BitfinexError::Validation(_) | BitfinexError::CapacityExceeded { .. }
        )
    }

    pub(crate) fn missing_fields(operation: &str, fields: &[&str]) -> Self {
        BitfinexError::Validation(format!("{operation}: {} is required", fields.join(", ")))
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, BitfinexError>;
