//! Error types for vector collection backends.

use thiserror::Error;

/// Result type alias for vector store operations.
pub type Result<T> = std::result::Result<T, VectorError>;

/// Errors that can occur in a vector store.
#[derive(Error, Debug)]
pub enum VectorError {
    /// The collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

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
