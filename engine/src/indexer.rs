//! Document indexing into per-repository collections.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use ragmark_sources::Document;
use ragmark_vector::{ChunkRecord, Metadata, VectorStore};

use crate::addressing;
use crate::chunker::ChunkSplitter;
use crate::error::Result;

/// Converts documents into chunk records and writes them to their
/// repository's collection.
pub struct DocumentIndexer {
    store: Arc<dyn VectorStore>,
    splitter: ChunkSplitter,
}

impl DocumentIndexer {
    /// Create an indexer writing to the given store.
    pub fn new(store: Arc<dyn VectorStore>, splitter: ChunkSplitter) -> Self {
        Self { store, splitter }
    }

    /// Index a batch of documents for a repository.
    ///
    /// Returns the number of chunk records written. An empty batch writes
    /// nothing, not even the collection. Chunk ids are derived from the
    /// document content hash, so re-indexing unchanged content overwrites
    /// records in place instead of duplicating them.
    pub async fn index(&self, repository: &str, documents: &[Document]) -> Result<usize> {
        if documents.is_empty() {
            debug!("No documents to index for {repository}");
            return Ok(0);
        }

        let collection_id = addressing::collection_id(repository);

        let mut creation_metadata = Metadata::new();
        creation_metadata.insert("repository".to_string(), json!(repository));
        self.store
            .get_or_create(&collection_id, creation_metadata)
            .await?;

        let mut records = Vec::new();
        for document in documents {
            let chunks = self.splitter.split(&document.content);
            let total_chunks = chunks.len();

            for (chunk_index, chunk) in chunks.into_iter().enumerate() {
                records.push(ChunkRecord::new(
                    format!("{}_{chunk_index}", document.content_hash),
                    chunk,
                    chunk_metadata(document, chunk_index, total_chunks),
                ));
            }
        }

        let record_count = records.len();
        // One bulk write per batch; a failure aborts the whole batch.
        self.store.upsert(&collection_id, records).await?;

        info!(
            "Indexed {record_count} chunks from {} documents into {collection_id}",
            documents.len()
        );
        Ok(record_count)
    }
}

/// Build the metadata stored with one chunk.
fn chunk_metadata(document: &Document, chunk_index: usize, total_chunks: usize) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("path".to_string(), json!(document.path));
    metadata.insert("name".to_string(), json!(document.name));
    metadata.insert("content_hash".to_string(), json!(document.content_hash));
    metadata.insert("directory".to_string(), json!(document.directory));
    metadata.insert("depth".to_string(), json!(document.depth));
    metadata.insert("chunk_index".to_string(), json!(chunk_index));
    metadata.insert("total_chunks".to_string(), json!(total_chunks));
    metadata.insert("file_type".to_string(), json!("markdown"));
    metadata.insert("file_size".to_string(), json!(document.size));
    metadata
}
