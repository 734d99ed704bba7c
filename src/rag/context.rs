use crate::ingest::{meta_str, AUTHOR, FILE_PATH, REPOSITORY, SOURCE_TYPE, TITLE};
use crate::store::SearchHit;

pub const BLOCK_SEPARATOR: &str = "\n---\n";

/// Context handed to the generator, plus how many candidates it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedContext {
    pub text: String,
    pub blocks_used: usize,
}

/// `[Source N] Type: … | Title: … | File: … | Repo: … | Author: …`, with
/// absent fields left out.
pub fn source_header(number: usize, hit: &SearchHit) -> String {
    let fields = [
        ("Type", SOURCE_TYPE),
        ("Title", TITLE),
        ("File", FILE_PATH),
        ("Repo", REPOSITORY),
        ("Author", AUTHOR),
    ];
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|(label, key)| {
            meta_str(&hit.metadata, key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{label}: {v}"))
        })
        .collect();

    if parts.is_empty() {
        format!("[Source {number}]")
    } else {
        format!("[Source {number}] {}", parts.join(" | "))
    }
}

/// Packs labeled blocks in rank order until the next one would push the
/// running length past `max_chars`.
///
/// The budget counts block characters, not separators, so the joined text
/// can exceed it by `(blocks_used - 1) * 5` characters.
pub fn pack_context(hits: &[SearchHit], max_chars: usize) -> PackedContext {
    let mut blocks = Vec::new();
    let mut used = 0usize;

    for (i, hit) in hits.iter().enumerate() {
        let block = format!("{}\n{}\n", source_header(i + 1, hit), hit.text);
        let len = block.chars().count();
        if used + len > max_chars {
            break;
        }
        used += len;
        blocks.push(block);
    }

    PackedContext {
        blocks_used: blocks.len(),
        text: blocks.join(BLOCK_SEPARATOR),
    }
}
