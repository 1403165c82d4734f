//! # Sync-and-Query Engine
//!
//! This crate is the core of ragmark: it ingests Markdown documentation
//! from a source repository into a per-repository vector collection and
//! answers natural-language questions over it.
//!
//! - **Chunking**: deterministic word-packing into bounded-size chunks
//! - **Addressing**: stable hashed collection ids per repository
//! - **Sync jobs**: background ingestion with an observable lifecycle
//! - **Search**: semantic ranking, optionally scoped to one directory
//! - **Answers**: retrieved chunks assembled into a bounded chat prompt
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         RagEngine                          │
//! ├────────────────────────────────────────────────────────────┤
//! │                                                            │
//! │  ┌────────────┐     ┌───────────────┐     ┌────────────┐   │
//! │  │  Document  │────▶│   Document    │────▶│   Vector   │   │
//! │  │   Source   │     │    Indexer    │     │    Store   │   │
//! │  └────────────┘     └───────────────┘     └────────────┘   │
//! │        ▲              ChunkSplitter             │          │
//! │        │                                        ▼          │
//! │  ┌────────────┐                          ┌────────────┐    │
//! │  │  Sync Job  │                          │   Search   │    │
//! │  │  Manager   │                          │   Engine   │    │
//! │  └────────────┘                          └────────────┘    │
//! │                                                 │          │
//! │                                                 ▼          │
//! │                                          ┌────────────┐    │
//! │                                          │  Answerer  │──▶ chat
//! │                                          └────────────┘    │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ragmark_engine::RagEngine;
//!
//! let engine = RagEngine::builder()
//!     .with_source(source)
//!     .with_store(store)
//!     .with_chat_model(chat)
//!     .build()?;
//!
//! let job_id = engine.submit_sync("owner/repo").await;
//! let answer = engine.ask("owner/repo", "How do I install it?", 5).await?;
//! ```

pub mod addressing;
pub mod answerer;
pub mod chunker;
pub mod config;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod jobs;
pub mod search;

pub use addressing::collection_id;
pub use answerer::{Answer, Answerer, SourceCitation};
pub use chunker::{ChunkSplitter, DEFAULT_CHUNK_SIZE};
pub use config::{AnswerConfig, ChunkingConfig, EngineConfig, JobConfig, SearchConfig};
pub use engine::{CollectionInfo, CollectionPeek, RagEngine, RagEngineBuilder};
pub use error::{EngineError, Result};
pub use indexer::DocumentIndexer;
pub use jobs::{
    JobOutcome, JobStatus, JobStore, MemoryJobStore, SyncJob, SyncJobManager, SyncReport,
    SyncStatus,
};
pub use search::{SearchEngine, SearchHit, SearchOutcome};

// Re-export from dependencies for convenience
pub use ragmark_llm::{ChatMessage, ChatModel, ChatRole};
pub use ragmark_sources::{Document, DocumentSource, StaticSource};
pub use ragmark_vector::{MemoryStore, VectorStore};
