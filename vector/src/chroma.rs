//! Chroma vector store client.
//!
//! Speaks the Chroma server's HTTP API (v1). Collection-level calls address
//! collections by name; record-level calls first resolve the name to the
//! server-side collection uuid. Embedding happens inside the server when
//! records are written.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::Metadata;
use crate::error::{Result, VectorError};
use crate::record::{ChunkRecord, CollectionSample, CollectionSummary, MetadataFilter, QueryMatch};
use crate::store::VectorStore;

/// Vector store backed by a Chroma server.
pub struct ChromaStore {
    /// Server base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,
}

impl ChromaStore {
    /// Create a client for a local Chroma server.
    pub fn new() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Set the server base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Resolve a collection name to the server-side collection object.
    async fn resolve(&self, collection_id: &str) -> Result<ChromaCollection> {
        let response = self
            .client
            .get(format!(
                "{}/api/v1/collections/{collection_id}",
                self.base_url
            ))
            .send()
            .await?;
        let response = check_status(collection_id, response).await?;
        Ok(response.json().await?)
    }
}

impl Default for ChromaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    fn name(&self) -> &str {
        "chroma"
    }

    async fn get_or_create(&self, collection_id: &str, metadata: Metadata) -> Result<()> {
        debug!("Ensuring collection {collection_id}");

        // Chroma rejects an empty metadata map; send null instead.
        let metadata = if metadata.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::Value::Object(metadata)
        };

        let body = json!({
            "name": collection_id,
            "metadata": metadata,
            "get_or_create": true,
        });

        let response = self
            .client
            .post(format!("{}/api/v1/collections", self.base_url))
            .json(&body)
            .send()
            .await?;
        check_status(collection_id, response).await?;
        Ok(())
    }

    async fn upsert(&self, collection_id: &str, records: Vec<ChunkRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let collection = self.resolve(collection_id).await?;

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let documents: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let metadatas: Vec<&Metadata> = records.iter().map(|r| &r.metadata).collect();

        debug!(
            "Upserting {} records into {collection_id} ({})",
            records.len(),
            collection.id
        );

        let body = json!({
            "ids": ids,
            "documents": documents,
            "metadatas": metadatas,
        });

        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/upsert",
                self.base_url, collection.id
            ))
            .json(&body)
            .send()
            .await?;
        check_status(collection_id, response).await?;
        Ok(())
    }

    async fn query(
        &self,
        collection_id: &str,
        query_text: &str,
        n_results: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        let collection = self.resolve(collection_id).await?;

        let mut body = json!({
            "query_texts": [query_text],
            "n_results": n_results,
            "include": ["documents", "metadatas", "distances"],
        });
        if let Some(filter) = filter {
            body["where"] = filter.to_where_clause();
        }

        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/query",
                self.base_url, collection.id
            ))
            .json(&body)
            .send()
            .await?;
        let response = check_status(collection_id, response).await?;
        let result: ChromaQueryResponse = response.json().await?;

        // One query text was sent, so only the first row of each field is
        // meaningful.
        let ids = result.ids.into_iter().next().unwrap_or_default();
        let documents = first_row(result.documents);
        let metadatas = first_row(result.metadatas);
        let distances = result
            .distances
            .unwrap_or_default()
            .into_iter()
            .next()
            .unwrap_or_default();

        let mut matches = Vec::with_capacity(ids.len());
        for (i, id) in ids.into_iter().enumerate() {
            matches.push(QueryMatch {
                id,
                text: documents.get(i).cloned().flatten().unwrap_or_default(),
                metadata: metadatas.get(i).cloned().flatten().unwrap_or_default(),
                distance: distances.get(i).copied().unwrap_or(0.0),
            });
        }
        Ok(matches)
    }

    async fn delete(&self, collection_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!(
                "{}/api/v1/collections/{collection_id}",
                self.base_url
            ))
            .send()
            .await?;
        check_status(collection_id, response).await?;
        debug!("Deleted collection {collection_id}");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CollectionSummary>> {
        let response = self
            .client
            .get(format!("{}/api/v1/collections", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorError::ApiRequest(format!(
                "status {status}: {error_text}"
            )));
        }

        let collections: Vec<ChromaCollection> = response.json().await?;
        Ok(collections
            .into_iter()
            .map(|c| CollectionSummary {
                id: c.name,
                metadata: c.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn count(&self, collection_id: &str) -> Result<usize> {
        let collection = self.resolve(collection_id).await?;
        let response = self
            .client
            .get(format!(
                "{}/api/v1/collections/{}/count",
                self.base_url, collection.id
            ))
            .send()
            .await?;
        let response = check_status(collection_id, response).await?;
        Ok(response.json().await?)
    }

    async fn peek(&self, collection_id: &str, limit: usize) -> Result<CollectionSample> {
        let collection = self.resolve(collection_id).await?;

        let body = json!({
            "limit": limit,
            "include": ["documents", "metadatas"],
        });

        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/get",
                self.base_url, collection.id
            ))
            .json(&body)
            .send()
            .await?;
        let response = check_status(collection_id, response).await?;
        let result: ChromaGetResponse = response.json().await?;

        Ok(CollectionSample {
            ids: result.ids,
            texts: result
                .documents
                .unwrap_or_default()
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect(),
            metadatas: result
                .metadatas
                .unwrap_or_default()
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect(),
        })
    }
}

/// Map non-success statuses to vector errors, folding the backend's
/// "does not exist" responses into `CollectionNotFound`.
async fn check_status(
    collection_id: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND || error_text.contains("does not exist") {
        return Err(VectorError::CollectionNotFound(collection_id.to_string()));
    }

    Err(VectorError::ApiRequest(format!(
        "status {status}: {error_text}"
    )))
}

/// First row of a nested per-query field.
fn first_row<T>(field: Option<Vec<Vec<T>>>) -> Vec<T> {
    field
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// A collection object as returned by the server.
#[derive(Debug, Deserialize)]
struct ChromaCollection {
    id: String,
    name: String,
    metadata: Option<Metadata>,
}

/// Query response: fields are parallel arrays, one row per query text.
#[derive(Debug, Deserialize)]
struct ChromaQueryResponse {
    ids: Vec<Vec<String>>,
    documents: Option<Vec<Vec<Option<String>>>>,
    metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    distances: Option<Vec<Vec<f32>>>,
}

/// Get response: flat parallel arrays.
#[derive(Debug, Deserialize)]
struct ChromaGetResponse {
    ids: Vec<String>,
    documents: Option<Vec<Option<String>>>,
    metadatas: Option<Vec<Option<Metadata>>>,
}
