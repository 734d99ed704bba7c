use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{normalize_text, Embedder, CHARS_PER_TOKEN};
use crate::error::Result;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;
const WHOLE_TEXT_WEIGHT: f32 = 1.0;

/// Offline embeddings by feature hashing.
///
/// Each lowercase alphanumeric word and each character trigram of the word
/// padded with `#` is hashed with SHA-256 into one of `dimensions` buckets,
/// with a hash-derived sign. The result is L2-normalized, so identical texts
/// map to identical vectors and texts sharing vocabulary score higher under
/// cosine similarity. Text without any word is hashed whole as a single
/// feature, so every input has a non-zero vector. No network, no model files.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
    batch_size: usize,
    max_chars: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(1536)
    }
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            batch_size: 100,
            max_chars: 8191 * CHARS_PER_TOKEN,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let (cleaned, _) = normalize_text(text, self.max_chars);
        let lowered = cleaned.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut vector = vec![0.0f32; self.dimensions];
        if words.is_empty() {
            let whole = if cleaned.is_empty() { text } else { cleaned.as_str() };
            self.add_feature(&mut vector, &format!("t:{whole}"), WHOLE_TEXT_WEIGHT);
        }
        for word in &words {
            self.add_feature(&mut vector, &format!("w:{word}"), WORD_WEIGHT);

            let padded: Vec<char> = format!("#{word}#").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut vector, &format!("g:{gram}"), TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(batch.iter().map(|text| self.vectorize(text)));
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn max_chars(&self) -> usize {
        self.max_chars
    }

    fn model_name(&self) -> &str {
        "hash"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(256);
        let a = embedder.embed_one("Install the dependencies").await.unwrap();
        let b = embedder.embed_one("install   the dependencies").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed_one("How do I set up?").await.unwrap();
        let setup = embedder.embed_one("# Setup\nInstall deps.").await.unwrap();
        let usage = embedder.embed_one("# Usage\nRun it.").await.unwrap();
        assert!(embedder.similarity(&query, &setup) > embedder.similarity(&query, &usage));
    }

    #[tokio::test]
    async fn test_tokenless_text_still_embeds() {
        let embedder = HashEmbedder::new(32);
        let marks = embedder.embed_one("?!  ...").await.unwrap();
        assert!(marks.iter().any(|x| *x != 0.0));
        assert_eq!(marks, embedder.embed_one("?! ...").await.unwrap());
        assert_ne!(marks, embedder.embed_one("!!").await.unwrap());

        let blank = embedder.embed_one("   ").await.unwrap();
        assert!(blank.iter().any(|x| *x != 0.0));

        let texts = vec!["alpha".to_string(), "---".to_string(), "beta".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], embedder.embed_one("alpha").await.unwrap());
        assert_eq!(vectors[1], embedder.embed_one("---").await.unwrap());
        assert_eq!(vectors[2], embedder.embed_one("beta").await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_spans_sub_batches_in_order() {
        let embedder = HashEmbedder::new(64).with_batch_size(2);
        let texts: Vec<String> = (0..5).map(|i| format!("doc {i}")).collect();
        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), 5);
        assert_eq!(vectors[4], embedder.embed_one("doc 4").await.unwrap());
    }
}
