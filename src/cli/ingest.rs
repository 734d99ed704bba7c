use anyhow::{bail, Context, Result};
use console::{style, Emoji};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{spinner, Workspace, ERROR, SUCCESS};
use crate::ingest::{lang::detect_language, Chunk, DocSource, DocType, RepoRef, SlackMessage};

static INGEST: Emoji<'_, '_> = Emoji("📥 ", "");

/// Files larger than this are skipped when walking directories.
const MAX_FILE_BYTES: u64 = 1024 * 1024;

/// Expands directories into the source files under them, leaving out prose
/// and data files. Explicit file arguments are kept as given.
fn collect_code_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            bail!("No such file or directory: {}", path.display());
        }

        for entry in WalkBuilder::new(path).build() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let file = entry.into_path();
            let too_big = fs::metadata(&file).map(|m| m.len() > MAX_FILE_BYTES).unwrap_or(true);
            let language = detect_language(&file.to_string_lossy());
            if too_big || matches!(language, "text" | "markdown" | "json") {
                continue;
            }
            files.push(file);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

async fn store_chunks(workspace: &Workspace, chunks: Vec<Chunk>, label: &str) -> Result<usize> {
    if chunks.is_empty() {
        println!("{}Nothing to ingest from {}", super::INFO, label);
        return Ok(0);
    }

    let count = chunks.len();
    let pb = spinner(format!("{}Embedding {} chunks from {}...", INGEST, count, label));
    let result = workspace.retriever.add_documents_batch(chunks).await;
    pb.finish_and_clear();

    let ids = result.with_context(|| format!("Failed to ingest {label}"))?;
    Ok(ids.len())
}

pub async fn run_ingest_code(workspace: &Workspace, paths: &[PathBuf], repo: RepoRef) -> Result<()> {
    let files = collect_code_files(paths)?;
    if files.is_empty() {
        println!("{}No source files found.", super::INFO);
        return Ok(());
    }

    let mut chunks = Vec::new();
    let mut skipped = Vec::new();
    for file in &files {
        match fs::read_to_string(file) {
            Ok(content) => {
                let path = file.to_string_lossy();
                let file_chunks = workspace.chunker.chunk_code(&path, &content, &repo);
                debug!("{}: {} chunks", path, file_chunks.len());
                chunks.extend(file_chunks);
            }
            Err(e) => skipped.push(format!("{}: {}", file.display(), e)),
        }
    }

    let label = format!("{} files", files.len() - skipped.len());
    let stored = store_chunks(workspace, chunks, &label).await?;

    println!("\n{}Code ingested!\n", SUCCESS);
    println!("  Files processed: {}", style(files.len() - skipped.len()).green());
    println!("  Chunks stored:   {}", style(stored).cyan());
    if !skipped.is_empty() {
        println!("\n{}Skipped ({}):", ERROR, skipped.len());
        for line in skipped.iter().take(10) {
            println!("  - {}", style(line).red());
        }
    }
    Ok(())
}

pub async fn run_ingest_docs(
    workspace: &Workspace,
    file: &Path,
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    doc_type: DocType,
) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let title = title.or_else(|| {
        file.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    });

    let source = DocSource {
        title,
        url,
        author,
        doc_type,
    };
    let chunks = workspace.chunker.chunk_documentation(&content, &source);
    let stored = store_chunks(workspace, chunks, &file.display().to_string()).await?;

    println!("{}Stored {} documentation chunks from {}", SUCCESS, style(stored).cyan(), file.display());
    Ok(())
}

pub async fn run_ingest_slack(workspace: &Workspace, file: &Path, channel: Option<String>) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let messages: Vec<SlackMessage> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of messages", file.display()))?;

    let chunks = workspace.chunker.chunk_slack(&messages, channel.as_deref());
    let stored = store_chunks(workspace, chunks, &file.display().to_string()).await?;

    println!(
        "{}Stored {} conversation chunks from {} messages",
        SUCCESS,
        style(stored).cyan(),
        messages.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_code_files_filters_by_language() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("src/app.py"), "def run(): pass").unwrap();
        fs::write(dir.path().join("notes.txt"), "plain").unwrap();

        let files = collect_code_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["app.py", "main.rs"]);
    }

    #[test]
    fn test_explicit_files_are_kept() {
        let dir = TempDir::new().unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "plain").unwrap();
        assert_eq!(collect_code_files(&[notes.clone()]).unwrap(), vec![notes]);
    }

    #[test]
    fn test_missing_path_errors() {
        assert!(collect_code_files(&[PathBuf::from("/definitely/not/here")]).is_err());
    }
}
