//! Error types for document sources.

use thiserror::Error;

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors that can occur while fetching documents.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The repository was not found or is not accessible.
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// File content could not be decoded.
    #[error("content decode failed for {path}: {reason}")]
    ContentDecode { path: String, reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
