//! In-memory vector store.
//!
//! A fully in-process [`VectorStore`] for tests, examples, and offline runs.
//! Ranking uses a deterministic pseudo-distance derived from token overlap:
//! the more of the query's tokens a chunk contains, the closer it ranks.
//! Ties break on record id so orderings are reproducible.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::Metadata;
use crate::error::{Result, VectorError};
use crate::record::{ChunkRecord, CollectionSample, CollectionSummary, MetadataFilter, QueryMatch};
use crate::store::VectorStore;

/// A named collection held in memory.
#[derive(Debug, Default)]
struct MemoryCollection {
    /// Metadata recorded at creation.
    metadata: Metadata,

    /// Records keyed by id; inserting an existing id replaces it.
    records: HashMap<String, ChunkRecord>,
}

/// In-memory [`VectorStore`] implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_or_create(&self, collection_id: &str, metadata: Metadata) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection_id.to_string())
            .or_insert_with(|| {
                debug!("Creating collection {collection_id}");
                MemoryCollection {
                    metadata,
                    records: HashMap::new(),
                }
            });
        Ok(())
    }

    async fn upsert(&self, collection_id: &str, records: Vec<ChunkRecord>) -> Result<()> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(collection_id)
            .ok_or_else(|| VectorError::CollectionNotFound(collection_id.to_string()))?;

        debug!("Upserting {} records into {collection_id}", records.len());
        for record in records {
            collection.records.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection_id: &str,
        query_text: &str,
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(collection_id)
            .ok_or_else(|| VectorError::CollectionNotFound(collection_id.to_string()))?;

        let query_tokens = tokens(query_text);
        let mut matches: Vec<QueryMatch> = collection
            .records
            .values()
            .filter(|record| filter.map_or(true, |f| f.matches(&record.metadata)))
            .map(|record| QueryMatch {
                id: record.id.clone(),
                text: record.text.clone(),
                metadata: record.metadata.clone(),
                distance: pseudo_distance(&query_tokens, &record.text),
            })
            .collect();

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(n_results);
        Ok(matches)
    }

    async fn delete(&self, collection_id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .remove(collection_id)
            .ok_or_else(|| VectorError::CollectionNotFound(collection_id.to_string()))?;
        debug!("Deleted collection {collection_id}");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CollectionSummary>> {
        let collections = self.collections.read().await;
        let mut summaries: Vec<CollectionSummary> = collections
            .iter()
            .map(|(id, collection)| CollectionSummary {
                id: id.clone(),
                metadata: collection.metadata.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    async fn count(&self, collection_id: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(collection_id)
            .ok_or_else(|| VectorError::CollectionNotFound(collection_id.to_string()))?;
        Ok(collection.records.len())
    }

    async fn peek(&self, collection_id: &str, limit: usize) -> Result<CollectionSample> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(collection_id)
            .ok_or_else(|| VectorError::CollectionNotFound(collection_id.to_string()))?;

        let mut ids: Vec<&String> = collection.records.keys().collect();
        ids.sort();

        let mut sample = CollectionSample::default();
        for id in ids.into_iter().take(limit) {
            if let Some(record) = collection.records.get(id) {
                sample.ids.push(record.id.clone());
                sample.texts.push(record.text.clone());
                sample.metadatas.push(record.metadata.clone());
            }
        }
        Ok(sample)
    }
}

/// Lowercased alphanumeric tokens of a text.
fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(String::from)
        .collect()
}

/// Pseudo-distance in [0, 1]: zero when the chunk contains every query
/// token, one when it contains none.
fn pseudo_distance(query_tokens: &HashSet<String>, text: &str) -> f32 {
    if query_tokens.is_empty() {
        return 1.0;
    }

    let text_tokens = tokens(text);
    let overlap = query_tokens.intersection(&text_tokens).count();
    1.0 - (overlap as f32 / query_tokens.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(id: &str, text: &str, directory: &str) -> ChunkRecord {
        let mut metadata = Metadata::new();
        metadata.insert("directory".to_string(), json!(directory));
        ChunkRecord::new(id, text, metadata)
    }

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.get_or_create("col", Metadata::new()).await.unwrap();
        store
            .upsert(
                "col",
                vec![
                    record("a_0", "rust async runtime internals", "docs"),
                    record("b_0", "cooking pasta at home", "recipes"),
                    record("c_0", "rust borrow checker guide", "docs"),
                ],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_query_ranks_by_token_overlap() {
        let store = seeded_store().await;

        let matches = store
            .query("col", "rust async runtime", 3, None)
            .await
            .unwrap();

        assert_eq!(matches[0].id, "a_0");
        assert!(matches[0].distance < matches[1].distance);
        assert_eq!(matches.last().map(|m| m.id.as_str()), Some("b_0"));
    }

    #[tokio::test]
    async fn test_query_applies_metadata_filter() {
        let store = seeded_store().await;
        let filter = MetadataFilter::equals("directory", "docs");

        let matches = store
            .query("col", "rust", 10, Some(&filter))
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.metadata["directory"] == "docs"));
    }

    #[tokio::test]
    async fn test_query_truncates_to_n_results() {
        let store = seeded_store().await;
        let matches = store.query("col", "rust", 1, None).await.unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = seeded_store().await;

        store
            .upsert("col", vec![record("a_0", "replaced text", "docs")])
            .await
            .unwrap();

        assert_eq!(store.count("col").await.unwrap(), 3);
        let sample = store.peek("col", 1).await.unwrap();
        assert_eq!(sample.ids, vec!["a_0"]);
        assert_eq!(sample.texts, vec!["replaced text"]);
    }

    #[tokio::test]
    async fn test_get_or_create_keeps_existing_metadata() {
        let store = MemoryStore::new();

        let mut original = Metadata::new();
        original.insert("repository".to_string(), json!("owner/name"));
        store.get_or_create("col", original).await.unwrap();

        let mut other = Metadata::new();
        other.insert("repository".to_string(), json!("someone/else"));
        store.get_or_create("col", other).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries[0].metadata["repository"], "owner/name");
    }

    #[tokio::test]
    async fn test_missing_collection_errors() {
        let store = MemoryStore::new();

        assert!(matches!(
            store.query("nope", "q", 1, None).await,
            Err(VectorError::CollectionNotFound(_))
        ));
        assert!(matches!(
            store.count("nope").await,
            Err(VectorError::CollectionNotFound(_))
        ));
        assert!(matches!(
            store.delete("nope").await,
            Err(VectorError::CollectionNotFound(_))
        ));
    }
}
