use std::sync::Arc;

use lorekeeper::embed::Embedder;
use lorekeeper::ingest::{Chunker, DocSource, SlackMessage, SourceType};
use lorekeeper::rag::FALLBACK_RESPONSE;
use lorekeeper::store::{SnapshotStore, VectorStore};
use lorekeeper::{HashEmbedder, Metadata, OfflineGenerator, Retriever};
use tempfile::TempDir;

fn retriever_at(dir: &TempDir) -> (Retriever, Arc<SnapshotStore>) {
    let store = Arc::new(SnapshotStore::open(dir.path().join("kb.json")));
    let retriever = Retriever::new(
        store.clone(),
        Arc::new(HashEmbedder::new(256)),
        Arc::new(OfflineGenerator),
    );
    (retriever, store)
}

#[tokio::test]
async fn markdown_setup_question_cites_setup_section() {
    let dir = TempDir::new().unwrap();
    let (retriever, _) = retriever_at(&dir);

    let chunks = Chunker::default().chunk_documentation(
        "# Setup\nDo X.\n# Usage\nDo Y.",
        &DocSource::markdown("Handbook"),
    );
    let titles: Vec<_> = chunks.iter().map(|c| c.title().unwrap().to_string()).collect();
    assert_eq!(titles, vec!["Setup", "Usage"]);

    let ids = retriever.add_documents_batch(chunks).await.unwrap();
    assert_eq!(ids.len(), 2);

    let result = retriever
        .answer("How do I set up?", Some(SourceType::Documentation), None)
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.sources[0].title, "Setup");
    assert_eq!(result.sources[1].title, "Usage");
    assert!(result.sources[0].similarity > result.sources[1].similarity);
    assert!(result.response.contains("Source 1"));
    assert_eq!(result.response.matches("🤖").count(), 1);
}

#[tokio::test]
async fn empty_store_answers_with_fallback() {
    let dir = TempDir::new().unwrap();
    let (retriever, _) = retriever_at(&dir);

    let result = retriever.answer("Where is the deploy script?", None, None).await;
    assert!(result.success);
    assert!(result.sources.is_empty());
    assert_eq!(result.response, FALLBACK_RESPONSE);
    assert!(result.no_relevant_docs);
}

#[tokio::test]
async fn slack_groups_split_on_long_gaps() {
    let chunker = Chunker::default();
    let far = [SlackMessage::new("a", "x", "0"), SlackMessage::new("b", "y", "5000")];
    let near = [SlackMessage::new("a", "x", "0"), SlackMessage::new("b", "y", "1000")];
    assert_eq!(chunker.chunk_slack(&far, Some("eng")).len(), 2);
    assert_eq!(chunker.chunk_slack(&near, Some("eng")).len(), 1);
}

#[tokio::test]
async fn add_then_delete_is_visible_to_search() {
    let dir = TempDir::new().unwrap();
    let (retriever, store) = retriever_at(&dir);

    let before = store.stats().await.unwrap().total_vectors;
    let id = retriever
        .add_document("Rotate the signing keys every quarter", Metadata::new())
        .await
        .unwrap();
    assert_eq!(store.stats().await.unwrap().total_vectors, before + 1);

    let embedder = HashEmbedder::new(256);
    let query = embedder.embed_one("rotate signing keys").await.unwrap();
    let hits = store.search(&query, 5, None).await.unwrap();
    assert!(hits.iter().any(|h| h.id == id));

    assert!(store.delete(&id).await.unwrap());
    let hits = store.search(&query, 5, None).await.unwrap();
    assert!(hits.iter().all(|h| h.id != id));
    assert!(!store.delete(&id).await.unwrap());
}

#[tokio::test]
async fn knowledge_base_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let (retriever, _) = retriever_at(&dir);
        let chunks = Chunker::default().chunk_code(
            "src/lib.rs",
            "pub fn connect(url: &str) -> Pool {\n    Pool::new(url)\n}\n",
            &Default::default(),
        );
        retriever.add_documents_batch(chunks).await.unwrap();
    }

    let (retriever, store) = retriever_at(&dir);
    assert_eq!(store.len().await.unwrap(), 1);
    let result = retriever
        .answer("how do I connect?", Some(SourceType::Code), None)
        .await;
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].title, "function: connect in lib.rs");
    assert_eq!(result.sources[0].file_path, "src/lib.rs");
}

#[test]
fn chunk_text_respects_size_and_covers_input() {
    let chunker = Chunker::new(120, 30).unwrap();
    let text: String = (0..40)
        .map(|i| format!("Step {i} installs a component. "))
        .collect();

    let chunks = chunker.chunk_text(&text);
    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.chars().count() <= 120));

    for sentence in text.split(". ").filter(|s| !s.trim().is_empty()) {
        let sentence = sentence.trim();
        assert!(
            chunks.iter().any(|c| c.contains(sentence)),
            "missing {sentence:?}"
        );
    }

    let short = "fits in one chunk";
    assert_eq!(chunker.chunk_text(short), vec![short.to_string()]);
}

#[tokio::test]
async fn similarity_is_symmetric_and_zero_for_zero_vectors() {
    let embedder = HashEmbedder::new(128);
    let a = embedder.embed_one("database migrations").await.unwrap();
    let b = embedder.embed_one("running migrations locally").await.unwrap();

    assert!((embedder.similarity(&a, &b) - embedder.similarity(&b, &a)).abs() < 1e-6);
    assert!((embedder.similarity(&a, &a) - 1.0).abs() < 1e-5);
    assert_eq!(embedder.similarity(&a, &vec![0.0; 128]), 0.0);
}
