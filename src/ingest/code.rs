use std::path::Path;

use super::lang::{detect_language, extractor_for, CodeBlock};
use super::text::chunk_text;
use super::types::{put, put_opt, Chunk, Metadata, SourceType, FILE_PATH, REPOSITORY, SOURCE_TYPE, SOURCE_URL, TITLE};

/// Where a source file came from.
#[derive(Debug, Clone, Default)]
pub struct RepoRef {
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub commit_hash: Option<String>,
}

impl RepoRef {
    pub fn new(repository: Option<String>, branch: Option<String>, commit_hash: Option<String>) -> Self {
        Self {
            repository,
            branch,
            commit_hash,
        }
    }
}

fn file_name(file_path: &str) -> &str {
    Path::new(file_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_path)
}

fn base_metadata(file_path: &str, language: &str, repo: &RepoRef) -> Metadata {
    let mut meta = Metadata::new();
    put(&mut meta, SOURCE_TYPE, SourceType::Code.as_str());
    put(&mut meta, FILE_PATH, file_path);
    put(&mut meta, "language", language);
    put_opt(&mut meta, REPOSITORY, repo.repository.as_deref());
    put_opt(&mut meta, "branch", repo.branch.as_deref());
    put_opt(&mut meta, "commit_hash", repo.commit_hash.as_deref());
    meta
}

pub(crate) fn chunk_code(
    file_path: &str,
    content: &str,
    repo: &RepoRef,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let language = detect_language(file_path);
    let lines: Vec<&str> = content.lines().collect();
    let blocks = extractor_for(language)
        .map(|extractor| extractor.extract(&lines))
        .unwrap_or_default();

    if blocks.is_empty() {
        return window_chunks(file_path, content, language, repo, chunk_size, chunk_overlap);
    }

    let mut chunks = Vec::with_capacity(blocks.len());
    for block in &blocks {
        chunks.extend(block_chunks(file_path, block, language, repo, chunk_size, chunk_overlap));
    }
    chunks
}

fn block_chunks(
    file_path: &str,
    block: &CodeBlock,
    language: &str,
    repo: &RepoRef,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    let mut meta = base_metadata(file_path, language, repo);
    put(&mut meta, "block_type", block.kind.as_str());
    put(&mut meta, "block_name", block.name.as_str());
    put(&mut meta, "line_start", block.line_start);
    put(&mut meta, "line_end", block.line_end);
    put(
        &mut meta,
        TITLE,
        format!("{}: {} in {}", block.kind.as_str(), block.name, file_name(file_path)),
    );
    put(
        &mut meta,
        SOURCE_URL,
        format!("file://{}#L{}", file_path, block.line_start),
    );

    if block.content.chars().count() <= chunk_size {
        return vec![Chunk::new(block.content.clone(), meta)];
    }

    // Oversized definitions keep their block identity across parts.
    chunk_text(&block.content, chunk_size, chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(part, text)| {
            let mut m = meta.clone();
            put(&mut m, "block_part", part);
            Chunk::new(text, m)
        })
        .collect()
}

fn window_chunks(
    file_path: &str,
    content: &str,
    language: &str,
    repo: &RepoRef,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    chunk_text(content, chunk_size, chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let mut meta = base_metadata(file_path, language, repo);
            put(&mut meta, "chunk_index", i);
            put(
                &mut meta,
                TITLE,
                format!("Code chunk {} from {}", i + 1, file_name(file_path)),
            );
            put(&mut meta, SOURCE_URL, format!("file://{file_path}"));
            Chunk::new(text, meta)
        })
        .collect()
}
