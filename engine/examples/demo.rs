//! Demo of the sync-and-query engine over in-memory backends.
//!
//! Usage: cargo run -p ragmark-engine --example demo
//!
//! Set OPENAI_API_KEY (directly or via a .env file) to see generated
//! answers; without it the demo stops after sync and search.

use std::sync::Arc;

use ragmark_engine::{Document, MemoryStore, RagEngine, StaticSource};
use ragmark_llm::{ChatModel, OpenAiChat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    println!("🚀 Ragmark Sync-and-Query Demo\n");

    let source = StaticSource::new().with_repository(
        "demo/handbook",
        vec![
            Document::new(
                "docs/install.md",
                "# Install\n\nInstall the tool with `cargo install ragmark` and \
                 check the version with `ragmark --version`.",
            ),
            Document::new(
                "docs/config.md",
                "# Configuration\n\nConfiguration lives in ragmark.toml next to \
                 the binary. Every key has a sensible default.",
            ),
            Document::new(
                "guides/deploy.md",
                "# Deploy\n\nRun the service behind a reverse proxy and ship the \
                 logs somewhere durable.",
            ),
        ],
    );

    let chat = match OpenAiChat::from_env() {
        Ok(chat) => Some(Arc::new(chat) as Arc<dyn ChatModel>),
        Err(err) => {
            println!("ℹ️  No chat backend ({err}); skipping the answer step\n");
            None
        }
    };

    let mut builder = RagEngine::builder()
        .with_source(Arc::new(source))
        .with_store(Arc::new(MemoryStore::new()));
    if let Some(chat) = chat.clone() {
        builder = builder.with_chat_model(chat);
    }
    let engine = builder.build()?;

    // Sync the repository
    println!("📁 Syncing demo/handbook...");
    let report = engine.index_sync("demo/handbook").await;
    println!("   ✓ Status: {:?}", report.status);
    println!("   ✓ {}\n", report.message);

    // Search the indexed chunks
    println!("🔍 Searching for \"install the tool\"...");
    let hits = engine.search("demo/handbook", "install the tool", 3).await;
    for hit in &hits {
        println!("   ✓ {} (score {:.3})", hit.path(), hit.score);
    }
    println!();

    // Directory-scoped search
    println!("🔍 Searching only docs/ for \"configuration\"...");
    let hits = engine
        .search_in_directory("demo/handbook", "docs", "configuration", 3)
        .await;
    for hit in &hits {
        println!("   ✓ {} (score {:.3})", hit.path(), hit.score);
    }
    println!();

    // Ask a question when a chat backend is available
    if chat.is_some() {
        println!("💬 Asking: How do I install the tool?");
        let answer = engine
            .ask("demo/handbook", "How do I install the tool?", 3)
            .await?;
        println!("   {}", answer.answer);
        for source in &answer.sources {
            println!("   ↳ {} (relevance {})", source.path, source.relevance);
        }
        println!();
    }

    // Administrative introspection
    println!("📊 Collections:");
    for collection in engine.list_collections().await? {
        println!(
            "   ✓ {} → {} ({} chunks)",
            collection.repository, collection.collection_id, collection.document_count
        );
    }

    Ok(())
}
