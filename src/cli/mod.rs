mod args;
mod demo;
mod ingest;
mod query;
mod store;

pub use args::{Args, Command, IngestSource};
pub use demo::run_demo;
pub use ingest::{run_ingest_code, run_ingest_docs, run_ingest_slack};
pub use query::run_query;
pub use store::{run_clear, run_delete, run_stats};

use anyhow::{Context, Result};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::embed::create_embedder;
use crate::generate::create_generator;
use crate::ingest::Chunker;
use crate::rag::Retriever;
use crate::store::SnapshotStore;

pub(crate) static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "");
pub(crate) static ERROR: Emoji<'_, '_> = Emoji("❌ ", "");
pub(crate) static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");

/// Loads configuration and applies global command-line overrides.
pub fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(store) = &args.store {
        config.store.path = store.clone();
    }
    Ok(config)
}

/// Everything a command needs to ingest or query.
pub struct Workspace {
    pub config: Config,
    pub chunker: Chunker,
    pub retriever: Retriever,
}

impl Workspace {
    pub fn open(config: Config) -> Result<Self> {
        let embedder = create_embedder(&config.embedder)?;
        let generator = create_generator(&config.generator)?;
        let store = SnapshotStore::open(&config.store.path)
            .with_dimension(embedder.dimensions())
            .and_then(|store| store.with_model(embedder.model_name()))
            .with_context(|| {
                format!(
                    "Store {} was built with a different embedder; clear it or point --store elsewhere",
                    config.store.path.display()
                )
            })?;

        let chunker = Chunker::from_config(&config.chunking)?;
        let retriever = Retriever::new(Arc::new(store), embedder, generator)
            .with_config(config.retrieval.clone());

        Ok(Self {
            config,
            chunker,
            retriever,
        })
    }
}

pub(crate) fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
