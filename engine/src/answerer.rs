//! Retrieval-augmented answer generation.
//!
//! A question is answered in three steps: retrieve candidate chunks,
//! assemble the best ones into a bounded context, and hand context plus
//! question to the chat backend. When retrieval comes back empty the chat
//! call is skipped entirely and a fixed fallback answer is returned; a
//! generation failure, in contrast, surfaces as an error because the call
//! is paid and not retryable here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ragmark_llm::{ChatMessage, ChatModel};

use crate::config::AnswerConfig;
use crate::error::Result;
use crate::search::{SearchEngine, SearchHit};

/// Fixed reply when retrieval produces no usable context.
const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "I don't have enough indexed context to answer that. Try syncing the repository first.";

/// Marker appended when the assembled context is cut at the budget.
const TRUNCATION_MARKER: &str = "\n\n[context truncated]";

/// Width of citation previews, in characters.
const PREVIEW_LEN: usize = 100;

/// System prompt keeping the model grounded in the supplied context.
const SYSTEM_PROMPT: &str = "You are an assistant that answers questions about a documentation repository.\n\
Follow these rules:\n\
1. Answer using only the provided context\n\
2. Say clearly when the context does not contain the answer\n\
3. Keep answers concise and accurate\n\
4. Format code and commands as Markdown";

/// One source citation of an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Path of the cited document.
    pub path: String,

    /// Relevance score, rounded to three decimals.
    pub relevance: f32,

    /// Position of the cited chunk within its document.
    pub chunk_index: usize,

    /// Short preview of the cited chunk.
    pub preview: String,
}

/// A generated answer and the chunks it was grounded in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The generated answer text.
    pub answer: String,

    /// Citations for the chunks shown to the model, in context order.
    pub sources: Vec<SourceCitation>,

    /// Number of chunks placed in the context.
    pub context_used: usize,

    /// The repository that was queried.
    pub repository: String,
}

/// Composes retrieved chunks into a bounded prompt and asks the chat model.
pub struct Answerer {
    search: Arc<SearchEngine>,
    chat: Arc<dyn ChatModel>,
    config: AnswerConfig,
}

impl Answerer {
    /// Create an answerer over the given search engine and chat backend.
    pub fn new(search: Arc<SearchEngine>, chat: Arc<dyn ChatModel>, config: AnswerConfig) -> Self {
        Self {
            search,
            chat,
            config,
        }
    }

    /// Answer a question from a repository's indexed content.
    ///
    /// At most `context_limit` chunks are shown to the model; retrieval
    /// fetches more than that so the context has material to draw on even
    /// when some candidates rank poorly. Citations cover exactly the chunks
    /// placed in the context, in order.
    pub async fn answer(
        &self,
        repository: &str,
        question: &str,
        context_limit: usize,
    ) -> Result<Answer> {
        let fetch = self.config.candidate_fetch.max(context_limit);
        let candidates = self
            .search
            .search(repository, question, fetch)
            .await
            .into_hits();

        if candidates.is_empty() {
            debug!("No context found in {repository} for {question:?}");
            return Ok(Answer {
                answer: INSUFFICIENT_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
                context_used: 0,
                repository: repository.to_string(),
            });
        }

        let shown: Vec<SearchHit> = candidates.into_iter().take(context_limit).collect();
        let context = assemble_context(&shown, self.config.context_char_budget);

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("Context:\n{context}\n\nQuestion: {question}")),
        ];
        let answer = self
            .chat
            .generate(messages, self.config.max_output_tokens)
            .await?;

        info!(
            "Answered question for {repository} using {} context chunks",
            shown.len()
        );
        Ok(Answer {
            answer,
            sources: shown.iter().map(citation).collect(),
            context_used: shown.len(),
            repository: repository.to_string(),
        })
    }
}

/// Concatenate chunks in rank order, each tagged with an ordinal and its
/// source path, then cut the whole string at the budget.
///
/// Truncation is applied to the assembled string, not per chunk, so one
/// large leading chunk can crowd out the rest.
fn assemble_context(hits: &[SearchHit], budget: usize) -> String {
    let sections: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("[{}] {}:\n{}", i + 1, hit.path(), hit.content))
        .collect();

    let assembled = sections.join("\n\n");
    if assembled.chars().count() <= budget {
        return assembled;
    }

    let mut cut: String = assembled.chars().take(budget).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

/// Build the citation for one context chunk.
fn citation(hit: &SearchHit) -> SourceCitation {
    SourceCitation {
        path: hit.path().to_string(),
        relevance: round_relevance(hit.score),
        chunk_index: hit.chunk_index(),
        preview: preview(&hit.content),
    }
}

/// Round a score to three decimals for display.
fn round_relevance(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

/// First [`PREVIEW_LEN`] characters of a chunk, with an ellipsis when cut.
fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LEN {
        return text.to_string();
    }
    let head: String = text.chars().take(PREVIEW_LEN).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::sync::Mutex;

    use ragmark_llm::LlmError;
    use ragmark_vector::{ChunkRecord, MemoryStore, Metadata, VectorStore};

    use crate::addressing;
    use crate::config::SearchConfig;

    /// Chat stub that records the prompt it was called with.
    struct ScriptedChat {
        reply: String,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        async fn calls(&self) -> Vec<Vec<ChatMessage>> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatModel for ScriptedChat {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            messages: Vec<ChatMessage>,
            _max_output_tokens: u32,
        ) -> ragmark_llm::Result<String> {
            self.calls.lock().await.push(messages);
            Ok(self.reply.clone())
        }
    }

    /// Chat stub that always fails.
    struct BrokenChat;

    #[async_trait::async_trait]
    impl ChatModel for BrokenChat {
        fn name(&self) -> &str {
            "broken"
        }

        async fn generate(
            &self,
            _messages: Vec<ChatMessage>,
            _max_output_tokens: u32,
        ) -> ragmark_llm::Result<String> {
            Err(LlmError::ApiRequest("model offline".to_string()))
        }
    }

    fn record(id: &str, path: &str, text: &str) -> ChunkRecord {
        let mut metadata = Metadata::new();
        metadata.insert("path".to_string(), json!(path));
        metadata.insert("directory".to_string(), json!(""));
        metadata.insert("chunk_index".to_string(), json!(0));
        ChunkRecord::new(id, text, metadata)
    }

    async fn seeded_search(records: Vec<ChunkRecord>) -> Arc<SearchEngine> {
        let store = MemoryStore::new();
        let collection_id = addressing::collection_id("owner/repo");
        store
            .get_or_create(&collection_id, Metadata::new())
            .await
            .unwrap();
        store.upsert(&collection_id, records).await.unwrap();
        Arc::new(SearchEngine::new(Arc::new(store), SearchConfig::default()))
    }

    fn answerer(search: Arc<SearchEngine>, chat: Arc<dyn ChatModel>) -> Answerer {
        Answerer::new(search, chat, AnswerConfig::default())
    }

    #[tokio::test]
    async fn test_answer_cites_context_chunks() {
        let search = seeded_search(vec![
            record("a_0", "docs/install.md", "install the tool with cargo"),
            record("b_0", "docs/usage.md", "run the tool from the shell"),
            record("c_0", "docs/faq.md", "unrelated frequently asked things"),
        ])
        .await;
        let chat = Arc::new(ScriptedChat::new("Install it with cargo."));
        let answerer = answerer(search, Arc::clone(&chat) as Arc<dyn ChatModel>);

        let answer = answerer
            .answer("owner/repo", "install the tool", 2)
            .await
            .unwrap();

        assert_eq!(answer.answer, "Install it with cargo.");
        assert_eq!(answer.context_used, 2);
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].path, "docs/install.md");
        assert_eq!(answer.repository, "owner/repo");

        // Every citation path appears in the prompt shown to the model.
        let calls = chat.calls().await;
        assert_eq!(calls.len(), 1);
        let prompt = &calls[0][1].content;
        for source in &answer.sources {
            assert!(prompt.contains(&source.path));
        }
        assert!(prompt.contains("Question: install the tool"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_skips_generation() {
        let search = Arc::new(SearchEngine::new(
            Arc::new(MemoryStore::new()),
            SearchConfig::default(),
        ));
        let chat = Arc::new(ScriptedChat::new("never used"));
        let answerer = answerer(search, Arc::clone(&chat) as Arc<dyn ChatModel>);

        let answer = answerer
            .answer("never/synced", "anything", 5)
            .await
            .unwrap();

        assert_eq!(answer.answer, INSUFFICIENT_CONTEXT_ANSWER);
        assert_eq!(answer.context_used, 0);
        assert!(answer.sources.is_empty());
        assert!(chat.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_surfaces_as_error() {
        let search = seeded_search(vec![record("a_0", "docs/a.md", "some indexed text")]).await;
        let answerer = answerer(search, Arc::new(BrokenChat));

        let result = answerer.answer("owner/repo", "indexed text", 3).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_large_context_is_truncated_with_marker() {
        let big = "lorem ".repeat(1000);
        let search = seeded_search(vec![record("a_0", "docs/big.md", big.trim())]).await;
        let chat = Arc::new(ScriptedChat::new("ok"));
        let answerer = answerer(search, Arc::clone(&chat) as Arc<dyn ChatModel>);

        answerer.answer("owner/repo", "lorem", 1).await.unwrap();

        let calls = chat.calls().await;
        let prompt = &calls[0][1].content;
        assert!(prompt.contains("[context truncated]"));
        // Budget, marker, and the question wrapper bound the prompt size.
        assert!(prompt.chars().count() < 3000 + 100);
    }

    #[test]
    fn test_preview_is_bounded() {
        let text = "x".repeat(250);
        let cut = preview(&text);

        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_LEN + 3);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_relevance_rounding() {
        assert_eq!(round_relevance(0.123_456), 0.123);
        assert_eq!(round_relevance(0.999_9), 1.0);
    }
}
