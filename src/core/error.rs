//! Error taxonomy shared by fetchers, normalizers and the analytics pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    /// Transport failure or non-2xx status. The only retryable class.
    #[error("Network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// Body received but it is not valid JSON.
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON decoded but the expected fields are missing or malformed.
    #[error("Unexpected payload: {0}")]
    Schema(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MarketError {
    pub fn network(url: &str, reason: impl ToString) -> Self {
        MarketError::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, MarketError::Network { .. })
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
