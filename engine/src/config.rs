//! Configuration for the sync-and-query engine.

use serde::{Deserialize, Serialize};

/// Configuration for the sync-and-query engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chunking configuration.
    pub chunking: ChunkingConfig,

    /// Search configuration.
    pub search: SearchConfig,

    /// Sync job configuration.
    pub jobs: JobConfig,

    /// Answer generation configuration.
    pub answer: AnswerConfig,
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size used when indexing documents.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunking.chunk_size = chunk_size;
        self
    }

    /// Set how long job records stay queryable.
    pub fn with_job_retention_secs(mut self, retention_secs: u64) -> Self {
        self.jobs.retention_secs = retention_secs;
        self
    }

    /// Set the character budget for assembled answer context.
    pub fn with_context_char_budget(mut self, budget: usize) -> Self {
        self.answer.context_char_budget = budget;
        self
    }

    /// Set the output token bound passed to the chat backend.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.answer.max_output_tokens = max_output_tokens;
        self
    }
}

/// Chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum serialized chunk length in characters.
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500 }
    }
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Over-fetch multiplier for directory-scoped queries. The backend
    /// applies the directory filter before ranking, so fetching extra
    /// candidates costs little and avoids starving the caller.
    pub directory_overfetch: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            directory_overfetch: 2,
        }
    }
}

/// Sync job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// How long job records stay queryable, in seconds, measured from
    /// `started_at` regardless of status.
    pub retention_secs: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            retention_secs: 3600,
        }
    }
}

/// Answer generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Minimum number of candidate chunks retrieved for context assembly,
    /// even when the caller asks to show fewer.
    pub candidate_fetch: usize,

    /// Character budget for the assembled context.
    pub context_char_budget: usize,

    /// Output token bound passed to the chat backend.
    pub max_output_tokens: u32,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            candidate_fetch: 10,
            context_char_budget: 3000,
            max_output_tokens: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.search.directory_overfetch, 2);
        assert_eq!(config.jobs.retention_secs, 3600);
        assert_eq!(config.answer.candidate_fetch, 10);
        assert_eq!(config.answer.context_char_budget, 3000);
        assert_eq!(config.answer.max_output_tokens, 500);
    }

    #[test]
    fn test_builder_methods() {
        let config = EngineConfig::new()
            .with_chunk_size(200)
            .with_job_retention_secs(60)
            .with_context_char_budget(1000)
            .with_max_output_tokens(256);

        assert_eq!(config.chunking.chunk_size, 200);
        assert_eq!(config.jobs.retention_secs, 60);
        assert_eq!(config.answer.context_char_budget, 1000);
        assert_eq!(config.answer.max_output_tokens, 256);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = EngineConfig::new().with_chunk_size(300);
        let json = serde_json::to_string(&config).unwrap();
        let restored: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.chunking.chunk_size, 300);
    }
}
