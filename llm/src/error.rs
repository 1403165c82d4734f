//! Error types for chat backends.

use thiserror::Error;

/// Result type alias for chat operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur in a chat backend.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Required API key is not set.
    #[error("{0} environment variable is not set")]
    ApiKeyMissing(&'static str),

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Response from the backend could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
