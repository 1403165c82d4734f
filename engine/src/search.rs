//! Semantic search over per-repository collections.
//!
//! The public contract is deliberately forgiving: a repository that was
//! never synced, or a backend that is down, both surface as "no results" on
//! the display path. The [`SearchOutcome`] tag keeps those causes apart for
//! callers that need to diagnose which one happened.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use ragmark_vector::{Metadata, MetadataFilter, VectorError, VectorStore};

use crate::addressing;
use crate::config::SearchConfig;

/// A ranked search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The chunk text.
    pub content: String,

    /// Full chunk metadata.
    pub metadata: Metadata,

    /// Relevance score derived from backend distance; higher is better.
    pub score: f32,
}

impl SearchHit {
    /// Path of the source document, when the metadata carries one.
    pub fn path(&self) -> &str {
        self.metadata
            .get("path")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown")
    }

    /// Chunk position within the source document, when the metadata
    /// carries one.
    pub fn chunk_index(&self) -> usize {
        self.metadata
            .get("chunk_index")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as usize
    }
}

/// Outcome of a search, keeping failure causes distinguishable.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Ranked hits, best first; may be empty when nothing matched.
    Hits(Vec<SearchHit>),

    /// The repository has no indexed content yet.
    NotIndexed,

    /// The vector backend failed; the detail is kept for diagnostics.
    BackendError(String),
}

impl SearchOutcome {
    /// Collapse to a plain hit list, the display-path default.
    pub fn into_hits(self) -> Vec<SearchHit> {
        match self {
            SearchOutcome::Hits(hits) => hits,
            SearchOutcome::NotIndexed | SearchOutcome::BackendError(_) => Vec::new(),
        }
    }
}

/// Convert a backend distance to a user-facing score.
///
/// Scores trend toward 1.0 for close matches and can go negative for very
/// distant ones; they are a ranking signal, not a probability.
fn score_from_distance(distance: f32) -> f32 {
    1.0 - distance / 2.0
}

/// Queries per-repository collections for relevant chunks.
pub struct SearchEngine {
    store: Arc<dyn VectorStore>,
    config: SearchConfig,
}

impl SearchEngine {
    /// Create a search engine over the given store.
    pub fn new(store: Arc<dyn VectorStore>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// Search a repository's collection for the chunks most relevant to
    /// `query`, best first.
    pub async fn search(&self, repository: &str, query: &str, n_results: usize) -> SearchOutcome {
        self.run_query(repository, query, n_results, None, n_results)
            .await
    }

    /// Search restricted to chunks whose directory equals `directory`.
    ///
    /// The backend applies the filter before ranking is cut off, so the
    /// query over-fetches and the result is truncated client-side. Fewer
    /// than `n_results` hits after filtering is normal, not an error.
    pub async fn search_by_directory(
        &self,
        repository: &str,
        directory: &str,
        query: &str,
        n_results: usize,
    ) -> SearchOutcome {
        let filter = MetadataFilter::equals("directory", directory);
        let fetch = n_results * self.config.directory_overfetch;
        self.run_query(repository, query, fetch, Some(filter), n_results)
            .await
    }

    async fn run_query(
        &self,
        repository: &str,
        query: &str,
        fetch: usize,
        filter: Option<MetadataFilter>,
        keep: usize,
    ) -> SearchOutcome {
        let collection_id = addressing::collection_id(repository);

        let mut creation_metadata = Metadata::new();
        creation_metadata.insert("repository".to_string(), json!(repository));
        if let Err(err) = self
            .store
            .get_or_create(&collection_id, creation_metadata)
            .await
        {
            warn!("Could not open collection {collection_id}: {err}");
            return SearchOutcome::BackendError(err.to_string());
        }

        // A freshly created or never-synced collection holds nothing;
        // report that as its own outcome instead of an empty ranking.
        match self.store.count(&collection_id).await {
            Ok(0) => return SearchOutcome::NotIndexed,
            Ok(_) => {}
            Err(err) => {
                warn!("Could not count collection {collection_id}: {err}");
                return SearchOutcome::BackendError(err.to_string());
            }
        }

        match self
            .store
            .query(&collection_id, query, fetch, filter.as_ref())
            .await
        {
            Ok(matches) => {
                let mut hits: Vec<SearchHit> = matches
                    .into_iter()
                    .map(|m| SearchHit {
                        content: m.text,
                        metadata: m.metadata,
                        score: score_from_distance(m.distance),
                    })
                    .collect();
                hits.truncate(keep);
                debug!(
                    "Search in {collection_id} for {query:?} returned {} hits",
                    hits.len()
                );
                SearchOutcome::Hits(hits)
            }
            Err(VectorError::CollectionNotFound(_)) => SearchOutcome::NotIndexed,
            Err(err) => {
                warn!("Search in {collection_id} failed: {err}");
                SearchOutcome::BackendError(err.to_string())
            }
        }
    }
}
