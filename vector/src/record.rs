//! Record and result types shared by all vector store backends.

use serde::{Deserialize, Serialize};

use crate::Metadata;

/// A chunk ready for storage: stable id, text, and flat metadata.
///
/// The id doubles as the upsert key, so writing the same record twice leaves
/// a single copy in the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Stable record id.
    pub id: String,

    /// The chunk text, which the backend embeds on write.
    pub text: String,

    /// Metadata attached to the chunk.
    pub metadata: Metadata,
}

impl ChunkRecord {
    /// Create a new chunk record.
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}

/// One ranked match from a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMatch {
    /// Record id of the matched chunk.
    pub id: String,

    /// The matched chunk text.
    pub text: String,

    /// Metadata stored with the chunk.
    pub metadata: Metadata,

    /// Backend distance; smaller is closer.
    pub distance: f32,
}

/// A collection as reported by `list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Collection id (the addressing-scheme name).
    pub id: String,

    /// Metadata recorded when the collection was created.
    pub metadata: Metadata,
}

/// A small sample of a collection's records, for introspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionSample {
    /// Record ids.
    pub ids: Vec<String>,

    /// Record texts, parallel to `ids`.
    pub texts: Vec<String>,

    /// Record metadata, parallel to `ids`.
    pub metadatas: Vec<Metadata>,
}

/// A single-field equality filter on record metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Metadata field to compare.
    pub field: String,

    /// Value the field must equal.
    pub value: serde_json::Value,
}

impl MetadataFilter {
    /// Create an equality filter.
    pub fn equals(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Render the filter as a Chroma-style `where` clause.
    pub fn to_where_clause(&self) -> serde_json::Value {
        serde_json::json!({ &self.field: { "$eq": self.value } })
    }

    /// Check whether a metadata map satisfies the filter.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        metadata.get(&self.field) == Some(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn metadata(directory: &str) -> Metadata {
        let mut map = Metadata::new();
        map.insert("directory".to_string(), json!(directory));
        map
    }

    #[test]
    fn test_filter_matches_equal_value() {
        let filter = MetadataFilter::equals("directory", "docs");

        assert!(filter.matches(&metadata("docs")));
        assert!(!filter.matches(&metadata("src")));
        assert!(!filter.matches(&Metadata::new()));
    }

    #[test]
    fn test_filter_where_clause_shape() {
        let filter = MetadataFilter::equals("directory", "docs/guide");

        assert_eq!(
            filter.to_where_clause(),
            json!({ "directory": { "$eq": "docs/guide" } })
        );
    }
}
