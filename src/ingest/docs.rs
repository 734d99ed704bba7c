use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::text::chunk_text;
use super::types::{put, put_opt, Chunk, Metadata, SourceType, AUTHOR, SOURCE_TYPE, SOURCE_URL, TITLE};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());

/// Format of an ingested document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocType {
    #[default]
    Markdown,
    Text,
    Other(String),
}

impl DocType {
    pub fn as_str(&self) -> &str {
        match self {
            DocType::Markdown => "markdown",
            DocType::Text => "text",
            DocType::Other(name) => name,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => DocType::Markdown,
            "text" | "txt" | "plain" => DocType::Text,
            other => DocType::Other(other.to_string()),
        })
    }
}

/// Descriptive fields for a document being chunked.
#[derive(Debug, Clone, Default)]
pub struct DocSource {
    pub title: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub doc_type: DocType,
}

impl DocSource {
    pub fn markdown(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct Section {
    title: String,
    level: usize,
    lines: Vec<String>,
}

impl Section {
    fn content(&self) -> String {
        self.lines.join("\n").trim_end().to_string()
    }
}

/// Splits markdown on ATX headings. Headings inside fenced code blocks are
/// body text. Text before the first heading becomes a level-0 section.
fn split_sections(content: &str, preamble_title: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        title: preamble_title.to_string(),
        level: 0,
        lines: Vec::new(),
    };
    let mut in_fence = false;
    let mut saw_heading = false;

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }

        let heading = if in_fence { None } else { HEADING.captures(line) };
        match heading {
            Some(caps) => {
                if current.level > 0 || current.lines.iter().any(|l| !l.trim().is_empty()) {
                    sections.push(current);
                }
                saw_heading = true;
                current = Section {
                    title: caps[2].trim().trim_end_matches('#').trim_end().to_string(),
                    level: caps[1].len(),
                    lines: vec![line.to_string()],
                };
            }
            None => current.lines.push(line.to_string()),
        }
    }

    if !saw_heading {
        return Vec::new();
    }
    sections.push(current);
    sections
}

/// GitHub-style heading anchor.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if (c == ' ' || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn base_metadata(source: &DocSource, created_at: &str) -> Metadata {
    let mut meta = Metadata::new();
    put(&mut meta, SOURCE_TYPE, SourceType::Documentation.as_str());
    put_opt(&mut meta, AUTHOR, source.author.as_deref());
    put(&mut meta, "doc_type", source.doc_type.as_str());
    put(&mut meta, "created_at", created_at);
    meta
}

pub(crate) fn chunk_documentation(
    content: &str,
    source: &DocSource,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let created_at = Utc::now().to_rfc3339();
    let url = source.url.as_deref().unwrap_or("").trim();
    let doc_title = source
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Introduction");

    let sections = match source.doc_type {
        DocType::Markdown => split_sections(content, doc_title),
        _ => Vec::new(),
    };

    if sections.is_empty() {
        return chunk_text(content, chunk_size, chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut meta = base_metadata(source, &created_at);
                let title = match source.title.as_deref().filter(|t| !t.trim().is_empty()) {
                    Some(t) => t.to_string(),
                    None => format!("Documentation chunk {}", i + 1),
                };
                put(&mut meta, TITLE, title);
                put(&mut meta, "chunk_index", i);
                put(&mut meta, SOURCE_URL, url);
                Chunk::new(text, meta)
            })
            .collect();
    }

    let mut chunks = Vec::with_capacity(sections.len());
    for section in &sections {
        let mut meta = base_metadata(source, &created_at);
        put(&mut meta, TITLE, section.title.as_str());
        put(&mut meta, "section_title", section.title.as_str());
        put(&mut meta, "section_level", section.level);
        let anchor = slugify(&section.title);
        let section_url = if url.is_empty() || section.level == 0 || anchor.is_empty() {
            url.to_string()
        } else {
            format!("{url}#{anchor}")
        };
        put(&mut meta, SOURCE_URL, section_url);

        let text = section.content();
        if text.chars().count() <= chunk_size {
            chunks.push(Chunk::new(text, meta));
            continue;
        }
        for (part, piece) in chunk_text(&text, chunk_size, chunk_overlap).into_iter().enumerate() {
            let mut m = meta.clone();
            put(&mut m, "section_part", part);
            chunks.push(Chunk::new(piece, m));
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::meta_str;

    fn source() -> DocSource {
        DocSource {
            title: Some("Guide".into()),
            url: Some("https://wiki.example.com/guide".into()),
            author: Some("dana".into()),
            doc_type: DocType::Markdown,
        }
    }

    #[test]
    fn test_markdown_sections() {
        let md = "# Setup\nInstall deps.\n## Usage\nRun it.";
        let chunks = chunk_documentation(md, &source(), 1000, 200);
        assert_eq!(chunks.len(), 2);

        assert_eq!(chunks[0].text, "# Setup\nInstall deps.");
        assert_eq!(chunks[0].title(), Some("Setup"));
        assert_eq!(chunks[0].metadata["section_level"], 1);
        assert_eq!(chunks[0].source_url(), Some("https://wiki.example.com/guide#setup"));
        assert_eq!(meta_str(&chunks[0].metadata, "author"), Some("dana"));
        assert_eq!(meta_str(&chunks[0].metadata, "doc_type"), Some("markdown"));

        assert_eq!(chunks[1].title(), Some("Usage"));
        assert_eq!(chunks[1].metadata["section_level"], 2);
        assert_eq!(chunks[1].source_type(), Some("documentation"));
    }

    #[test]
    fn test_preamble_is_kept() {
        let md = "Welcome to the team.\n\n# Setup\nInstall deps.";
        let chunks = chunk_documentation(md, &source(), 1000, 200);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].title(), Some("Guide"));
        assert_eq!(chunks[0].metadata["section_level"], 0);
        assert_eq!(chunks[0].source_url(), Some("https://wiki.example.com/guide"));
        assert_eq!(chunks[0].text, "Welcome to the team.");
    }

    #[test]
    fn test_headings_inside_fences_are_body() {
        let md = "# Scripts\n```bash\n# not a heading\necho hi\n```\n# Next\nbody";
        let chunks = chunk_documentation(md, &source(), 1000, 200);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.contains("# not a heading"));
    }

    #[test]
    fn test_heading_only_section_is_emitted() {
        let chunks = chunk_documentation("# Empty\n# Full\ntext", &source(), 1000, 200);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "# Empty");
    }

    #[test]
    fn test_plain_text_falls_back_to_windows() {
        let src = DocSource {
            doc_type: DocType::Text,
            ..source()
        };
        let chunks = chunk_documentation("# Looks like a heading\nbut is text", &src, 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].title(), Some("Guide"));
        assert_eq!(chunks[0].metadata["chunk_index"], 0);
        assert_eq!(chunks[0].source_url(), Some("https://wiki.example.com/guide"));
    }

    #[test]
    fn test_markdown_without_headings_uses_numbered_titles() {
        let chunks = chunk_documentation("just prose", &DocSource::default(), 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].title(), Some("Documentation chunk 1"));
        assert_eq!(chunks[0].source_url(), Some(""));
        assert!(!chunks[0].metadata.contains_key("author"));
    }

    #[test]
    fn test_empty_content() {
        assert!(chunk_documentation("", &source(), 1000, 200).is_empty());
        assert!(chunk_documentation(" \n\t", &source(), 1000, 200).is_empty());
    }

    #[test]
    fn test_oversized_section_is_split() {
        let body = "Sentence number one is here. ".repeat(40);
        let md = format!("# Long\n{body}");
        let chunks = chunk_documentation(&md, &source(), 200, 40);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.title() == Some("Long")));
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 200));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("API: v2 (beta)"), "api-v2-beta");
        assert_eq!(slugify("  Trailing -- dashes  "), "trailing-dashes");
    }

    #[test]
    fn test_doc_type_parse() {
        assert_eq!("md".parse::<DocType>().unwrap(), DocType::Markdown);
        assert_eq!("TXT".parse::<DocType>().unwrap(), DocType::Text);
        assert_eq!("rst".parse::<DocType>().unwrap(), DocType::Other("rst".into()));
    }
}
