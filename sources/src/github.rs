//! GitHub document source.
//!
//! Fetches Markdown files from a GitHub repository through the REST
//! contents API, walking the tree to a bounded depth. The walk is
//! deliberately forgiving: a path that fails to list prunes that subtree,
//! a file that fails to decode is skipped, and a repository that cannot be
//! listed at all yields an empty result for the sync layer to report.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::{Result, SourceError};
use crate::source::DocumentSource;

/// Default maximum directory nesting explored below the repository root.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Default cap on the number of files returned per fetch.
pub const DEFAULT_MAX_FILES: usize = 50;

/// Document source backed by the GitHub REST API.
pub struct GithubSource {
    /// Bearer token, anonymous access when absent.
    token: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Maximum directory depth to walk.
    max_depth: usize,

    /// Maximum number of files to return.
    max_files: usize,
}

impl GithubSource {
    /// Create a new GitHub source, reading `GITHUB_TOKEN` from the
    /// environment when set.
    pub fn new() -> Self {
        Self {
            token: std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            base_url: "https://api.github.com".to_string(),
            client: reqwest::Client::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    /// Set the API token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the maximum directory depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum number of files returned per fetch.
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Walk the repository tree and collect decoded Markdown documents.
    async fn collect_markdown(&self, repository: &str) -> Vec<Document> {
        let mut documents = Vec::new();
        let mut pending = vec![(String::new(), 0usize)];

        while let Some((path, depth)) = pending.pop() {
            if depth > self.max_depth {
                warn!("Max depth {} reached at {repository}/{path}", self.max_depth);
                continue;
            }

            let entries = match self.list_path(repository, &path).await {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("Listing {repository}/{path} failed: {err}");
                    continue;
                }
            };

            for entry in entries {
                if entry.kind == "dir" {
                    pending.push((entry.path, depth + 1));
                } else if entry.kind == "file" && entry.name.ends_with(".md") {
                    match self.fetch_file(repository, &entry.path).await {
                        Ok(doc) => {
                            debug!("Found {} ({} chars)", doc.path, doc.size);
                            documents.push(doc);
                        }
                        Err(err) => warn!("Reading {} failed: {err}", entry.path),
                    }
                }
            }
        }

        documents
    }

    /// List the entries at a repository path.
    async fn list_path(&self, repository: &str, path: &str) -> Result<Vec<ContentEntry>> {
        let response = self
            .contents_request(repository, path)
            .send()
            .await?;
        let response = self.check_status(repository, response).await?;
        Ok(response.json().await?)
    }

    /// Fetch one file and decode its content.
    async fn fetch_file(&self, repository: &str, path: &str) -> Result<Document> {
        let response = self
            .contents_request(repository, path)
            .send()
            .await?;
        let response = self.check_status(repository, response).await?;
        let file: FileContent = response.json().await?;

        if file.encoding != "base64" {
            return Err(SourceError::ContentDecode {
                path: path.to_string(),
                reason: format!("unsupported encoding: {}", file.encoding),
            });
        }

        let cleaned: String = file.content.split_whitespace().collect();
        let bytes = BASE64
            .decode(cleaned)
            .map_err(|err| SourceError::ContentDecode {
                path: path.to_string(),
                reason: err.to_string(),
            })?;
        let content = String::from_utf8(bytes).map_err(|err| SourceError::ContentDecode {
            path: path.to_string(),
            reason: err.to_string(),
        })?;

        Ok(Document::new(path, content).with_content_hash(file.sha))
    }

    /// Build a contents-API request for a repository path.
    fn contents_request(&self, repository: &str, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/repos/{repository}/contents/{path}", self.base_url);
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "ragmark");

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        request
    }

    /// Map non-success statuses to source errors.
    async fn check_status(
        &self,
        repository: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::RepositoryNotFound(repository.to_string()));
        }

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(SourceError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiRequest(format!(
                "status {status}: {error_text}"
            )));
        }

        Ok(response)
    }
}

impl Default for GithubSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentSource for GithubSource {
    fn name(&self) -> &str {
        "github"
    }

    async fn fetch_documents(&self, repository: &str) -> Result<Vec<Document>> {
        debug!("Fetching markdown files from {repository}");

        let mut documents = self.collect_markdown(repository).await;
        let total = documents.len();

        // Smallest files first, then cap the batch.
        documents.sort_by_key(|doc| doc.size);
        documents.truncate(self.max_files);

        info!(
            "Found {total} markdown files in {repository}, returning {}",
            documents.len()
        );

        Ok(documents)
    }
}

/// One entry of a directory listing.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// A file object with inline content.
#[derive(Debug, Deserialize)]
struct FileContent {
    sha: String,
    content: String,
    encoding: String,
}
