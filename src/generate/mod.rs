//! Answer generation backends.

mod chat;
mod offline;

pub use chat::ChatGenerator;
pub use offline::OfflineGenerator;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};

/// Leading line of every answer shown to the user.
pub const RESPONSE_MARKER: &str = "🤖 **AI Response**";

/// System and user messages for one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String>;
    fn model_name(&self) -> &str;
}

/// Picks the generation backend once, from configuration.
///
/// OpenAI without a key, or `offline`, selects [`OfflineGenerator`].
pub fn create_generator(config: &GeneratorConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.trim().to_ascii_lowercase().as_str() {
        "openai" => match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                let endpoint = config
                    .endpoint
                    .as_deref()
                    .unwrap_or("https://api.openai.com/v1");
                Ok(Arc::new(
                    ChatGenerator::new(endpoint, &config.model)?
                        .with_api_key(key)
                        .with_sampling(config.temperature, config.max_tokens),
                ))
            }
            None => {
                warn!("OPENAI_API_KEY not set, answers will be generated in demo mode");
                Ok(Arc::new(OfflineGenerator))
            }
        },
        // Ollama serves an OpenAI-compatible chat API under /v1.
        "ollama" => {
            let endpoint = config
                .endpoint
                .as_deref()
                .unwrap_or("http://localhost:11434/v1");
            Ok(Arc::new(
                ChatGenerator::new(endpoint, &config.model)?
                    .with_sampling(config.temperature, config.max_tokens),
            ))
        }
        "offline" | "demo" | "none" => Ok(Arc::new(OfflineGenerator)),
        other => Err(Error::Config(format!(
            "unknown generator provider '{other}' (expected openai, ollama or offline)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_generator_without_key_is_offline() {
        let generator = create_generator(&GeneratorConfig::default()).unwrap();
        assert_eq!(generator.model_name(), "offline");
    }

    #[test]
    fn test_create_generator_with_key() {
        let config = GeneratorConfig {
            api_key: Some("sk-test".into()),
            ..GeneratorConfig::default()
        };
        assert_eq!(create_generator(&config).unwrap().model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_create_generator_rejects_unknown() {
        let config = GeneratorConfig {
            provider: "palm".into(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(create_generator(&config), Err(Error::Config(_))));
    }
}
