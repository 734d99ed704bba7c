use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{normalize_text, Embedder, CHARS_PER_TOKEN};
use crate::error::{Error, Result};

/// Wire protocol spoken by the embedding endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// `POST {endpoint}/embeddings`, as served by OpenAI and compatible gateways.
    OpenAi,
    /// `POST {endpoint}/api/embed`.
    Ollama,
}

impl ProviderKind {
    fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Ollama => "Ollama",
        }
    }
}

/// Embeddings from a remote model over HTTP.
pub struct HttpEmbedder {
    kind: ProviderKind,
    endpoint: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
    batch_size: usize,
    batch_delay: Duration,
    max_chars: usize,
    client: Client,
}

#[derive(Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl HttpEmbedder {
    pub fn new(kind: ProviderKind, endpoint: &str, model: &str, dimensions: usize) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;

        Ok(Self {
            kind,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
            api_key: None,
            batch_size: 100,
            batch_delay: Duration::from_millis(100),
            max_chars: 8191 * CHARS_PER_TOKEN,
            client,
        })
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn with_batching(mut self, batch_size: usize, delay: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.batch_delay = delay;
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn connect_error(&self, e: reqwest::Error) -> Error {
        if e.is_connect() {
            Error::Embedding(format!(
                "cannot connect to {} at {}. Is the service running?",
                self.kind.label(),
                self.endpoint
            ))
        } else if e.is_timeout() {
            Error::Embedding(format!("{} request timed out", self.kind.label()))
        } else {
            Error::Embedding(format!("{} request failed: {e}", self.kind.label()))
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if self.kind == ProviderKind::Ollama && (status.as_u16() == 404 || body.contains("not found")) {
            return Err(Error::Embedding(format!(
                "model '{}' not found. Pull it with: ollama pull {}",
                self.model, self.model
            )));
        }
        Err(Error::Embedding(format!(
            "{} error ({status}): {body}",
            self.kind.label()
        )))
    }

    /// One request for one sub-batch of already normalized texts.
    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = match self.kind {
            ProviderKind::OpenAi => {
                let request = self
                    .client
                    .post(format!("{}/embeddings", self.endpoint))
                    .json(&OpenAiEmbedRequest {
                        model: &self.model,
                        input: inputs,
                    });
                let response = self
                    .authorized(request)
                    .send()
                    .await
                    .map_err(|e| self.connect_error(e))?;
                let mut parsed: OpenAiEmbedResponse = self
                    .check_status(response)
                    .await?
                    .json()
                    .await
                    .map_err(|e| Error::Embedding(format!("malformed OpenAI response: {e}")))?;
                parsed.data.sort_by_key(|d| d.index);
                parsed.data.into_iter().map(|d| d.embedding).collect::<Vec<_>>()
            }
            ProviderKind::Ollama => {
                let request = self
                    .client
                    .post(format!("{}/api/embed", self.endpoint))
                    .json(&OllamaEmbedRequest {
                        model: &self.model,
                        input: inputs,
                        truncate: true,
                    });
                let response = self
                    .authorized(request)
                    .send()
                    .await
                    .map_err(|e| self.connect_error(e))?;
                let parsed: OllamaEmbedResponse = self
                    .check_status(response)
                    .await?
                    .json()
                    .await
                    .map_err(|e| Error::Embedding(format!("malformed Ollama response: {e}")))?;
                parsed.embeddings
            }
        };

        if vectors.len() != inputs.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.len(),
            });
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let (cleaned, _) = normalize_text(text, self.max_chars);
        if cleaned.is_empty() {
            return Err(Error::invalid_input("cannot embed empty text"));
        }
        self.request(&[cleaned])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("no embedding returned".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let cleaned: Vec<String> = texts
            .iter()
            .map(|t| normalize_text(t, self.max_chars).0)
            .collect();

        let mut all = Vec::with_capacity(cleaned.len());
        for (i, batch) in cleaned.chunks(self.batch_size).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            debug!(batch = i, size = batch.len(), "Embedding sub-batch");
            all.extend(self.request(batch).await?);
        }
        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn max_chars(&self) -> usize {
        self.max_chars
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<()> {
        match self.kind {
            ProviderKind::OpenAi => self.embed_one("health check").await.map(|_| ()),
            ProviderKind::Ollama => {
                let response = self
                    .client
                    .get(format!("{}/api/tags", self.endpoint))
                    .send()
                    .await
                    .map_err(|e| self.connect_error(e))?;
                let tags: OllamaTagsResponse = self.check_status(response).await?.json().await?;
                let available = tags.models.iter().any(|m| {
                    m.name.starts_with(&self.model) || m.name == format!("{}:latest", self.model)
                });
                if !available {
                    return Err(Error::Embedding(format!(
                        "model '{}' not installed. Pull it with: ollama pull {}",
                        self.model, self.model
                    )));
                }
                Ok(())
            }
        }
    }
}
