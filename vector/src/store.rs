//! The vector store abstraction.

use async_trait::async_trait;

use crate::Metadata;
use crate::error::Result;
use crate::record::{ChunkRecord, CollectionSample, CollectionSummary, MetadataFilter, QueryMatch};

/// Trait for vector collection backends.
///
/// A store owns named collections of chunk records and answers similarity
/// queries over them. Embedding computation happens inside the backend on
/// write; callers only ever see text, metadata, and distances.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Create the collection if it does not exist.
    ///
    /// `metadata` is recorded at creation time only; an existing collection
    /// keeps whatever metadata it was created with.
    async fn get_or_create(&self, collection_id: &str, metadata: Metadata) -> Result<()>;

    /// Write records to a collection in one bulk call, keyed by record id.
    async fn upsert(&self, collection_id: &str, records: Vec<ChunkRecord>) -> Result<()>;

    /// Query a collection for the `n_results` records closest to
    /// `query_text`, closest first, optionally restricted by a metadata
    /// equality filter applied before ranking is cut off.
    async fn query(
        &self,
        collection_id: &str,
        query_text: &str,
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>>;

    /// Delete a collection and all its records.
    async fn delete(&self, collection_id: &str) -> Result<()>;

    /// List all collections.
    async fn list(&self) -> Result<Vec<CollectionSummary>>;

    /// Count the records in a collection.
    async fn count(&self, collection_id: &str) -> Result<usize>;

    /// Return up to `limit` records from a collection, for introspection.
    async fn peek(&self, collection_id: &str, limit: usize) -> Result<CollectionSample>;
}
