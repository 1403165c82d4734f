//! The sync-and-query engine facade.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ragmark_llm::ChatModel;
use ragmark_sources::DocumentSource;
use ragmark_vector::{CollectionSample, VectorStore};

use crate::addressing;
use crate::answerer::{Answer, Answerer};
use crate::chunker::ChunkSplitter;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::indexer::DocumentIndexer;
use crate::jobs::{JobStore, MemoryJobStore, SyncJob, SyncJobManager, SyncReport};
use crate::search::{SearchEngine, SearchHit, SearchOutcome};

/// How many records a collection peek shows per field.
const PEEK_SAMPLE_LEN: usize = 3;

/// Width of peeked document previews, in characters.
const PEEK_PREVIEW_LEN: usize = 100;

/// A collection as reported by [`RagEngine::list_collections`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection id under the addressing scheme.
    pub collection_id: String,

    /// Literal repository identifier recorded at creation time, or
    /// `unknown` for collections created without one.
    pub repository: String,

    /// Number of stored chunk records.
    pub document_count: usize,
}

/// A sample of one repository's collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionPeek {
    /// The repository that was peeked.
    pub repository: String,

    /// Collection id under the addressing scheme.
    pub collection_id: String,

    /// Total number of stored chunk records.
    pub total_documents: usize,

    /// Up to a few records, with previews instead of full texts.
    pub sample: CollectionSample,
}

/// The retrieval-augmented sync-and-query engine.
///
/// One engine instance coordinates a document source, a vector store, an
/// optional chat backend, and the job table. All per-repository state lives
/// in the vector store; the engine itself only holds the wiring.
pub struct RagEngine {
    store: Arc<dyn VectorStore>,
    search: Arc<SearchEngine>,
    jobs: SyncJobManager,
    answerer: Option<Answerer>,
}

impl RagEngine {
    /// Create a new engine builder.
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::new()
    }

    /// Fetch and index a repository, blocking until done.
    pub async fn index_sync(&self, repository: &str) -> SyncReport {
        self.jobs.run_sync(repository).await
    }

    /// Start a background sync and return its job id.
    pub async fn submit_sync(&self, repository: &str) -> String {
        self.jobs.submit(repository).await
    }

    /// Look up a sync job. `None` means the job never existed or has
    /// expired from the job table.
    pub async fn get_sync_status(&self, job_id: &str) -> Option<SyncJob> {
        self.jobs.status(job_id).await
    }

    /// Search a repository for relevant chunks; failures collapse to an
    /// empty result.
    pub async fn search(&self, repository: &str, query: &str, limit: usize) -> Vec<SearchHit> {
        self.search.search(repository, query, limit).await.into_hits()
    }

    /// Search a repository, keeping the failure cause distinguishable.
    pub async fn search_outcome(
        &self,
        repository: &str,
        query: &str,
        limit: usize,
    ) -> SearchOutcome {
        self.search.search(repository, query, limit).await
    }

    /// Search restricted to one directory. An empty directory falls back
    /// to an unscoped search.
    pub async fn search_in_directory(
        &self,
        repository: &str,
        directory: &str,
        query: &str,
        limit: usize,
    ) -> Vec<SearchHit> {
        if directory.is_empty() {
            return self.search(repository, query, limit).await;
        }
        self.search
            .search_by_directory(repository, directory, query, limit)
            .await
            .into_hits()
    }

    /// Answer a question from a repository's indexed content.
    ///
    /// Fails with [`EngineError::ChatModelNotConfigured`] when the engine
    /// was built without a chat backend.
    pub async fn ask(&self, repository: &str, question: &str, context_limit: usize) -> Result<Answer> {
        let answerer = self
            .answerer
            .as_ref()
            .ok_or(EngineError::ChatModelNotConfigured)?;
        answerer.answer(repository, question, context_limit).await
    }

    /// List all collections with their repository and record count.
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let summaries = self.store.list().await?;

        let mut collections = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let document_count = match self.store.count(&summary.id).await {
                Ok(count) => count,
                Err(err) => {
                    warn!("Could not count collection {}: {err}", summary.id);
                    0
                }
            };
            let repository = summary
                .metadata
                .get("repository")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            collections.push(CollectionInfo {
                collection_id: summary.id,
                repository,
                document_count,
            });
        }
        Ok(collections)
    }

    /// Delete a collection by its collection id.
    pub async fn delete_collection(&self, collection_id: &str) -> Result<()> {
        self.store.delete(collection_id).await?;
        info!("Deleted collection {collection_id}");
        Ok(())
    }

    /// Sample a repository's collection: total record count plus up to a
    /// few records with previewed texts.
    pub async fn peek_collection(&self, repository: &str, limit: usize) -> Result<CollectionPeek> {
        let collection_id = addressing::collection_id(repository);

        let total_documents = self.store.count(&collection_id).await?;
        let mut sample = self.store.peek(&collection_id, limit).await?;

        sample.ids.truncate(PEEK_SAMPLE_LEN);
        sample.metadatas.truncate(PEEK_SAMPLE_LEN);
        sample.texts.truncate(PEEK_SAMPLE_LEN);
        sample.texts = sample
            .texts
            .into_iter()
            .map(|text| preview_text(&text))
            .collect();

        Ok(CollectionPeek {
            repository: repository.to_string(),
            collection_id,
            total_documents,
            sample,
        })
    }
}

/// First [`PEEK_PREVIEW_LEN`] characters of a stored text, with an ellipsis
/// when cut.
fn preview_text(text: &str) -> String {
    if text.chars().count() <= PEEK_PREVIEW_LEN {
        return text.to_string();
    }
    let head: String = text.chars().take(PEEK_PREVIEW_LEN).collect();
    format!("{head}...")
}

/// Builder for [`RagEngine`].
pub struct RagEngineBuilder {
    config: EngineConfig,
    source: Option<Arc<dyn DocumentSource>>,
    store: Option<Arc<dyn VectorStore>>,
    chat: Option<Arc<dyn ChatModel>>,
    job_store: Option<Arc<dyn JobStore>>,
}

impl RagEngineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            source: None,
            store: None,
            chat: None,
            job_store: None,
        }
    }

    /// Set the document source (required).
    pub fn with_source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the vector store (required).
    pub fn with_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the chat backend used by [`RagEngine::ask`].
    pub fn with_chat_model(mut self, chat: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Replace the in-memory job store.
    pub fn with_job_store(mut self, job_store: Arc<dyn JobStore>) -> Self {
        self.job_store = Some(job_store);
        self
    }

    /// Replace the default configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<RagEngine> {
        let source = self
            .source
            .ok_or_else(|| EngineError::Config("a document source is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| EngineError::Config("a vector store is required".to_string()))?;
        let job_store = self
            .job_store
            .unwrap_or_else(|| Arc::new(MemoryJobStore::new()));

        let splitter = ChunkSplitter::new(self.config.chunking.chunk_size);
        let indexer = Arc::new(DocumentIndexer::new(Arc::clone(&store), splitter));
        let search = Arc::new(SearchEngine::new(
            Arc::clone(&store),
            self.config.search.clone(),
        ));
        let jobs = SyncJobManager::new(
            Arc::clone(&source),
            indexer,
            job_store,
            &self.config.jobs,
        );
        let answerer = self
            .chat
            .map(|chat| Answerer::new(Arc::clone(&search), chat, self.config.answer.clone()));

        info!(
            "Engine initialized (source: {}, store: {}, chat: {})",
            source.name(),
            store.name(),
            if answerer.is_some() { "yes" } else { "no" }
        );
        Ok(RagEngine {
            store,
            search,
            jobs,
            answerer,
        })
    }
}

impl Default for RagEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ragmark_sources::StaticSource;
    use ragmark_vector::MemoryStore;

    #[test]
    fn test_build_requires_source_and_store() {
        let missing_source = RagEngine::builder()
            .with_store(Arc::new(MemoryStore::new()))
            .build();
        assert!(matches!(missing_source, Err(EngineError::Config(_))));

        let missing_store = RagEngine::builder()
            .with_source(Arc::new(StaticSource::new()))
            .build();
        assert!(matches!(missing_store, Err(EngineError::Config(_))));
    }

    #[tokio::test]
    async fn test_ask_without_chat_model_fails_fast() {
        let engine = RagEngine::builder()
            .with_source(Arc::new(StaticSource::new()))
            .with_store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();

        let result = engine.ask("owner/repo", "anything", 3).await;

        assert!(matches!(result, Err(EngineError::ChatModelNotConfigured)));
    }

    #[test]
    fn test_preview_text_is_bounded() {
        let text = "y".repeat(500);
        let cut = preview_text(&text);

        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PEEK_PREVIEW_LEN + 3);
        assert_eq!(preview_text("tiny"), "tiny");
    }
}
