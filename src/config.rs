use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "lorekeeper.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub embedder: EmbedderConfig,
    pub generator: GeneratorConfig,
    pub store: StoreConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// `openai`, `ollama` or `hash`.
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub dimensions: usize,
    pub batch_size: usize,
    /// Pause between sub-batches sent to a remote provider.
    pub batch_delay_ms: u64,
    /// Input budget in tokens; texts are cut at four characters per token.
    pub max_tokens: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            endpoint: None,
            api_key: None,
            dimensions: 1536,
            batch_size: 100,
            batch_delay_ms: 100,
            max_tokens: 8191,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// `openai`, `ollama` or `offline`.
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            api_key: None,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".lorekeeper").join("vectors.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidates fetched from the store per query.
    pub top_k: usize,
    /// Candidates reported as sources and checked for citations.
    pub max_sources: usize,
    pub max_context_chars: usize,
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_sources: 5,
            max_context_chars: 4000,
            preview_chars: 300,
        }
    }
}

impl Config {
    /// Defaults, then the first config file found, then environment overrides.
    ///
    /// An explicit path must exist. Otherwise `./lorekeeper.toml` and
    /// `<config dir>/lorekeeper/config.toml` are tried in that order.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover() {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&raw)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        let user = dirs::config_dir()?.join("lorekeeper").join("config.toml");
        user.is_file().then_some(user)
    }

    /// Applies `LOREKEEPER_*` and `OPENAI_API_KEY` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = lookup("LOREKEEPER_STORE") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(provider) = lookup("LOREKEEPER_EMBEDDER") {
            self.embedder.provider = provider;
        }
        if let Some(provider) = lookup("LOREKEEPER_GENERATOR") {
            self.generator.provider = provider;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.embedder.api_key.get_or_insert_with(|| key.clone());
            self.generator.api_key.get_or_insert(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ChunkingConfig {
            chunk_size,
            chunk_overlap,
        } = self.chunking;
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({chunk_overlap}) must be smaller than chunking.chunk_size ({chunk_size})"
            )));
        }
        if self.embedder.dimensions == 0 {
            return Err(Error::Config("embedder.dimensions must be greater than zero".into()));
        }
        if self.embedder.batch_size == 0 {
            return Err(Error::Config("embedder.batch_size must be greater than zero".into()));
        }
        if self.embedder.max_tokens == 0 {
            return Err(Error::Config("embedder.max_tokens must be greater than zero".into()));
        }
        if self.retrieval.top_k == 0 || self.retrieval.max_sources == 0 {
            return Err(Error::Config(
                "retrieval.top_k and retrieval.max_sources must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.max_context_chars, 4000);
        assert_eq!(config.embedder.batch_size, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [chunking]
            chunk_size = 500

            [embedder]
            provider = "hash"
            dimensions = 256
            "#,
        )
        .unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.embedder.provider, "hash");
        assert_eq!(config.embedder.dimensions, 256);
        assert_eq!(config.generator.model, "gpt-4o-mini");
    }

    #[test]
    fn test_validate_rejects_bad_overlap() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = 1000;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        let mut config = Config::default();
        config.embedder.dimensions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LOREKEEPER_STORE", "/tmp/kb.json"),
            ("LOREKEEPER_EMBEDDER", "hash"),
            ("OPENAI_API_KEY", "sk-test"),
            ("LOREKEEPER_GENERATOR", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.generator.api_key = Some("sk-explicit".into());
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.store.path, PathBuf::from("/tmp/kb.json"));
        assert_eq!(config.embedder.provider, "hash");
        assert_eq!(config.generator.provider, "openai");
        assert_eq!(config.embedder.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.generator.api_key.as_deref(), Some("sk-explicit"));
    }

    #[test]
    fn test_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.toml");
        std::fs::write(&path, "[store]\npath = \"kb/vectors.json\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.store.path, PathBuf::from("kb/vectors.json"));

        let missing = dir.path().join("nope.toml");
        assert!(matches!(Config::from_file(&missing), Err(Error::Config(_))));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = Config::default();
        config.embedder.api_key = Some("sk-secret".into());
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("sk-secret"));
    }
}
