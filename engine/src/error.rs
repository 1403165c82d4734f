//! Error types for the sync-and-query engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Document source error.
    #[error("source error: {0}")]
    Source(#[from] ragmark_sources::SourceError),

    /// Vector store error.
    #[error("vector store error: {0}")]
    Vector(#[from] ragmark_vector::VectorError),

    /// Chat backend error.
    #[error("chat error: {0}")]
    Chat(#[from] ragmark_llm::LlmError),

    /// The engine was built without a chat model.
    #[error("no chat model configured")]
    ChatModelNotConfigured,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
