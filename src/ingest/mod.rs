//! Turning raw content into cited, embeddable chunks.

mod code;
mod docs;
pub mod lang;
mod slack;
mod text;
mod types;

pub use code::RepoRef;
pub use docs::{slugify, DocSource, DocType};
pub use slack::{format_timestamp, SlackMessage, GROUP_GAP_SECS};
pub use text::BOUNDARY_LOOKBACK;
pub use types::{meta_str, Chunk, Metadata, SourceType, AUTHOR, FILE_PATH, REPOSITORY, SOURCE_TYPE, SOURCE_URL, TITLE};

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Splits code, documentation and chat into chunks no longer than
/// `chunk_size` characters, with `chunk_overlap` characters shared between
/// consecutive windows.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::invalid_input("chunk_size must be greater than zero"));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::invalid_input(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Plain sliding-window split, preferring sentence and line boundaries.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        text::chunk_text(text, self.chunk_size, self.chunk_overlap)
    }

    /// One chunk per top-level definition, or windows when none are found.
    pub fn chunk_code(&self, file_path: &str, content: &str, repo: &RepoRef) -> Vec<Chunk> {
        code::chunk_code(file_path, content, repo, self.chunk_size, self.chunk_overlap)
    }

    /// One chunk per markdown section, or windows for other formats.
    pub fn chunk_documentation(&self, content: &str, source: &DocSource) -> Vec<Chunk> {
        docs::chunk_documentation(content, source, self.chunk_size, self.chunk_overlap)
    }

    /// One chunk per conversation group.
    pub fn chunk_slack(&self, messages: &[SlackMessage], channel: Option<&str>) -> Vec<Chunk> {
        slack::chunk_slack(messages, channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_overlap_not_smaller_than_size() {
        assert!(matches!(Chunker::new(100, 100), Err(Error::InvalidInput(_))));
        assert!(matches!(Chunker::new(100, 150), Err(Error::InvalidInput(_))));
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_default_sizes() {
        let chunker = Chunker::default();
        assert_eq!(chunker.chunk_size(), 1000);
        assert_eq!(chunker.chunk_overlap(), 200);
    }

    #[test]
    fn test_every_chunker_tags_citation_fields() {
        let chunker = Chunker::default();
        let mut chunks = chunker.chunk_code("lib.rs", "pub fn run() {}\n", &RepoRef::default());
        chunks.extend(chunker.chunk_documentation("# Title\nbody", &DocSource::default()));
        chunks.extend(chunker.chunk_slack(&[SlackMessage::new("u", "hi", "1")], Some("general")));
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.source_type().is_some());
            assert!(chunk.title().is_some_and(|t| !t.is_empty()));
            assert!(chunk.source_url().is_some());
        }
    }
}
