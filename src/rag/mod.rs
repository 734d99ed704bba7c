//! Query-time orchestration: retrieve, pack, generate, cite.

mod citations;
mod context;
mod prompt;

pub use citations::{bind_citations, build_sources, RESPONSE_MARKER};
pub use context::{pack_context, source_header, PackedContext, BLOCK_SEPARATOR};
pub use prompt::{build_prompt, APOLOGY_RESPONSE, FALLBACK_RESPONSE};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

pub use crate::config::RetrievalConfig;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::generate::Generator;
use crate::ingest::{Chunk, Metadata, SourceType};
use crate::store::{NewEntry, StoreStats, VectorStore};

/// A cited candidate, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub similarity: f64,
    pub source_type: String,
    pub title: String,
    pub url: String,
    pub file_path: String,
    pub repository: String,
    pub author: String,
    pub preview: String,
    pub source_number: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub response: String,
    pub sources: Vec<SourceRef>,
    /// Wall-clock seconds spent answering.
    pub processing_time: f64,
    /// Candidates that made it into the generator's context.
    pub context_used: usize,
    pub success: bool,
    pub no_relevant_docs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    fn failed(error: &Error, started: Instant) -> Self {
        Self {
            response: APOLOGY_RESPONSE.to_string(),
            sources: Vec::new(),
            processing_time: started.elapsed().as_secs_f64(),
            context_used: 0,
            success: false,
            no_relevant_docs: false,
            error: Some(error.to_string()),
        }
    }
}

/// Answers questions from the knowledge base and feeds it new chunks.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            config: RetrievalConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Answers `query` with citations. Never fails: pipeline errors come back
    /// as `success == false` with the apology text and the error message.
    pub async fn answer(
        &self,
        query: &str,
        source_type: Option<SourceType>,
        max_context_chars: Option<usize>,
    ) -> QueryResult {
        let started = Instant::now();
        let budget = max_context_chars.unwrap_or(self.config.max_context_chars);

        match self.try_answer(query, source_type, budget, started).await {
            Ok(result) => {
                info!(
                    sources = result.sources.len(),
                    context_used = result.context_used,
                    "Answered query in {:.2}s",
                    result.processing_time
                );
                result
            }
            Err(e) => {
                error!("Failed to answer query: {}", e);
                QueryResult::failed(&e, started)
            }
        }
    }

    async fn try_answer(
        &self,
        query: &str,
        source_type: Option<SourceType>,
        budget: usize,
        started: Instant,
    ) -> Result<QueryResult> {
        if query.trim().is_empty() {
            return Err(Error::invalid_input("query must not be empty"));
        }

        let query_vector = self.embedder.embed_one(query).await?;
        let hits = self
            .store
            .search(&query_vector, self.config.top_k, source_type)
            .await?;
        debug!(candidates = hits.len(), "Retrieved candidates");

        if hits.is_empty() {
            return Ok(QueryResult {
                response: FALLBACK_RESPONSE.to_string(),
                sources: Vec::new(),
                processing_time: started.elapsed().as_secs_f64(),
                context_used: 0,
                success: true,
                no_relevant_docs: true,
                error: None,
            });
        }

        let packed = pack_context(&hits, budget);
        let prompt = build_prompt(query, &packed.text);
        let raw = self.generator.generate(&prompt).await?;
        let response = bind_citations(&raw, &hits, self.config.max_sources);
        let sources = build_sources(&hits, self.config.max_sources, self.config.preview_chars);

        Ok(QueryResult {
            response,
            sources,
            processing_time: started.elapsed().as_secs_f64(),
            context_used: packed.blocks_used,
            success: true,
            no_relevant_docs: false,
            error: None,
        })
    }

    /// Embeds and stores one text, returning its id.
    pub async fn add_document(&self, text: &str, metadata: Metadata) -> Result<String> {
        let vector = self.embedder.embed_one(text).await?;
        let id = self.store.add(text.to_string(), vector, metadata).await?;
        info!("Added document to knowledge base: {}", id);
        Ok(id)
    }

    /// Embeds all chunks in one batch and stores them together.
    pub async fn add_documents_batch(&self, chunks: Vec<Chunk>) -> Result<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| NewEntry::new(chunk.text, vector, chunk.metadata))
            .collect();
        let ids = self.store.add_batch(entries).await?;
        info!("Added {} documents to knowledge base", ids.len());
        Ok(ids)
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }
}
