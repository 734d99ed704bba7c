mod hash;
mod http;

pub use hash::HashEmbedder;
pub use http::{HttpEmbedder, ProviderKind};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::EmbedderConfig;
use crate::error::{Error, Result};
use crate::store::cosine_similarity;

/// Rough character budget per model token.
pub const CHARS_PER_TOKEN: usize = 4;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds every text, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }

    fn dimensions(&self) -> usize;

    /// Longest input, in characters, sent to the model.
    fn max_chars(&self) -> usize;

    fn model_name(&self) -> &str;

    async fn health_check(&self) -> Result<()>;
}

/// Collapses whitespace runs, trims, and cuts the text to `max_chars`
/// characters. Returns the cleaned text and whether it was cut.
pub fn normalize_text(text: &str, max_chars: usize) -> (String, bool) {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let len = cleaned.chars().count();
    if len <= max_chars {
        return (cleaned, false);
    }

    let truncated: String = cleaned.chars().take(max_chars).collect();
    warn!(
        original_chars = len,
        truncated_chars = max_chars,
        "Text truncated from {} to {} characters",
        len,
        max_chars
    );
    (truncated, true)
}

/// Picks the embedding backend once, from configuration.
///
/// A remote provider without the credentials or endpoint it needs degrades to
/// the offline [`HashEmbedder`] with a warning.
pub fn create_embedder(config: &EmbedderConfig) -> Result<Arc<dyn Embedder>> {
    let max_chars = config.max_tokens * CHARS_PER_TOKEN;
    let delay = Duration::from_millis(config.batch_delay_ms);

    match config.provider.trim().to_ascii_lowercase().as_str() {
        "openai" => match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                let endpoint = config
                    .endpoint
                    .as_deref()
                    .unwrap_or("https://api.openai.com/v1");
                Ok(Arc::new(
                    HttpEmbedder::new(ProviderKind::OpenAi, endpoint, &config.model, config.dimensions)?
                        .with_api_key(key)
                        .with_batching(config.batch_size, delay)
                        .with_max_chars(max_chars),
                ))
            }
            None => {
                warn!("OPENAI_API_KEY not set, falling back to offline hash embeddings");
                Ok(Arc::new(hash_embedder(config, max_chars)))
            }
        },
        "ollama" => {
            let endpoint = config.endpoint.as_deref().unwrap_or("http://localhost:11434");
            Ok(Arc::new(
                HttpEmbedder::new(ProviderKind::Ollama, endpoint, &config.model, config.dimensions)?
                    .with_batching(config.batch_size, delay)
                    .with_max_chars(max_chars),
            ))
        }
        "hash" | "offline" | "mock" => Ok(Arc::new(hash_embedder(config, max_chars))),
        other => Err(Error::Config(format!(
            "unknown embedder provider '{other}' (expected openai, ollama or hash)"
        ))),
    }
}

fn hash_embedder(config: &EmbedderConfig, max_chars: usize) -> HashEmbedder {
    HashEmbedder::new(config.dimensions)
        .with_batch_size(config.batch_size)
        .with_max_chars(max_chars)
}
