//! # Vector Collections
//!
//! This crate provides the vector-collection side of ragmark: named
//! collections of chunk records with similarity queries over them.
//!
//! The [`VectorStore`] trait is the seam the engine builds on. Two backends
//! are included:
//!
//! - [`ChromaStore`]: a client for a Chroma server's HTTP API; the server
//!   computes embeddings when records are written
//! - [`MemoryStore`]: an in-process store with deterministic token-overlap
//!   ranking, for tests and offline runs
//!
//! Distances are reported as the backend produced them; turning a distance
//! into a user-facing score is the caller's concern.

pub mod chroma;
pub mod error;
pub mod memory;
pub mod record;
pub mod store;

pub use chroma::ChromaStore;
pub use error::{Result, VectorError};
pub use memory::MemoryStore;
pub use record::{ChunkRecord, CollectionSample, CollectionSummary, MetadataFilter, QueryMatch};
pub use store::VectorStore;

/// Flat metadata attached to records and collections.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
