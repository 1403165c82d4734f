//! Document source abstraction.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;

/// Trait for document sources.
///
/// A source fetches the indexable documents of a repository. An empty result
/// is a normal outcome (nothing to index, or the repository is not
/// accessible), not an error; errors are reserved for failures the caller may
/// want to report verbatim.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Get the name of this source.
    fn name(&self) -> &str;

    /// Fetch the documents of the given repository.
    async fn fetch_documents(&self, repository: &str) -> Result<Vec<Document>>;
}

/// An in-memory document source seeded with fixed content.
///
/// Useful for tests, examples, and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    repositories: HashMap<String, Vec<Document>>,
}

impl StaticSource {
    /// Create an empty static source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a repository with documents.
    pub fn with_repository(
        mut self,
        repository: impl Into<String>,
        documents: Vec<Document>,
    ) -> Self {
        self.repositories.insert(repository.into(), documents);
        self
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_documents(&self, repository: &str) -> Result<Vec<Document>> {
        Ok(self
            .repositories
            .get(repository)
            .cloned()
            .unwrap_or_default())
    }
}
