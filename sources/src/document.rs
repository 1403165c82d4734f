//! The document model shared by all sources.
//!
//! A [`Document`] is one source file as fetched at sync time: its repository
//! path, raw content, and a content-addressed hash identifying this version
//! of the file. Everything downstream (chunk ids, directory filters) is
//! derived from these fields.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a derived content hash, in hex characters.
const CONTENT_HASH_LEN: usize = 40;

/// A source file fetched from a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Path within the repository (unique per repository).
    pub path: String,

    /// File name (final path component).
    pub name: String,

    /// Raw file content.
    pub content: String,

    /// Content-addressed identity for this version of the file.
    pub content_hash: String,

    /// Parent directory of the path, empty for root-level files.
    pub directory: String,

    /// Nesting level: the number of `/` separators in the path.
    pub depth: usize,

    /// Content length in characters.
    pub size: usize,
}

impl Document {
    /// Create a document from a repository path and its content.
    ///
    /// Name, directory, depth, and size are derived from the path and
    /// content; the content hash defaults to a digest of the content.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();

        let name = path
            .rsplit('/')
            .next()
            .unwrap_or(path.as_str())
            .to_string();
        let directory = match path.rfind('/') {
            Some(idx) => path[..idx].to_string(),
            None => String::new(),
        };
        let depth = path.matches('/').count();
        let size = content.chars().count();
        let content_hash = hash_content(&content);

        Self {
            path,
            name,
            content,
            content_hash,
            directory,
            depth,
            size,
        }
    }

    /// Override the derived content hash with one supplied by the source
    /// (e.g. an upstream blob sha).
    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = hash.into();
        self
    }
}

/// Derive a stable content hash for a document version.
pub fn hash_content(content: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(content.as_bytes()));
    digest[..CONTENT_HASH_LEN].to_string()
}
