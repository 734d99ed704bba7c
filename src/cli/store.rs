use anyhow::Result;
use console::style;

use super::{ERROR, INFO, SUCCESS};
use crate::config::Config;
use crate::store::{SnapshotStore, VectorStore};

pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let store = SnapshotStore::open(&config.store.path);
    let stats = store.stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n{}Knowledge base: {}\n", INFO, stats.storage_path);
    println!("  Total vectors:   {}", style(stats.total_vectors).green());
    if let Some(dim) = stats.dimension {
        println!("  Dimensions:      {}", dim);
    }
    println!("  Snapshot size:   {} KB", style(stats.size_bytes / 1024).yellow());
    for (source_type, count) in &stats.source_types {
        println!("  {:<16} {}", format!("{source_type}:"), style(count).cyan());
    }
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let store = SnapshotStore::open(&config.store.path);
    if store.delete(id).await? {
        println!("{}Deleted {}", SUCCESS, id);
        Ok(())
    } else {
        println!("{}No entry with id {}", ERROR, id);
        anyhow::bail!("entry {id} not found")
    }
}

pub async fn run_clear(config: &Config) -> Result<()> {
    if !config.store.path.exists() {
        println!("{}No store found.", INFO);
        return Ok(());
    }
    let store = SnapshotStore::open(&config.store.path);
    store.clear().await?;
    println!("{}Knowledge base cleared.", SUCCESS);
    Ok(())
}
