use crate::ingest::{meta_str, AUTHOR, FILE_PATH, REPOSITORY, SOURCE_TYPE, SOURCE_URL, TITLE};
use crate::store::SearchHit;

use super::SourceRef;
pub use crate::generate::RESPONSE_MARKER;

/// Whether `text` contains `Source {number}` not followed by another digit.
fn mentions_label(text: &str, number: usize) -> bool {
    let label = format!("Source {number}");
    text.match_indices(&label).any(|(pos, _)| {
        !text[pos + label.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Adds the response marker and a citation line for every top candidate the
/// answer neither labels (`Source N`) nor names by title. Only the generated
/// text is searched, so parts of a split section sharing one title are each
/// cited.
pub fn bind_citations(response: &str, hits: &[SearchHit], max_sources: usize) -> String {
    let mut out = if response.starts_with('#') || response.starts_with(RESPONSE_MARKER) {
        response.to_string()
    } else {
        format!("{RESPONSE_MARKER}\n\n{response}")
    };

    for (i, hit) in hits.iter().take(max_sources).enumerate() {
        let number = i + 1;
        let Some(title) = meta_str(&hit.metadata, TITLE).filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        if mentions_label(response, number) || response.contains(title) {
            continue;
        }

        out.push_str(&format!("\n\n**Source {number}:** {title}"));
        if let Some(path) = meta_str(&hit.metadata, FILE_PATH).filter(|p| !p.is_empty()) {
            out.push_str(&format!(" ({path})"));
        }
    }
    out
}

fn round3(value: f32) -> f64 {
    (f64::from(value) * 1000.0).round() / 1000.0
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

pub fn build_sources(hits: &[SearchHit], max_sources: usize, preview_chars: usize) -> Vec<SourceRef> {
    hits.iter()
        .take(max_sources)
        .enumerate()
        .map(|(i, hit)| {
            let field = |key: &str| meta_str(&hit.metadata, key).unwrap_or("").to_string();
            SourceRef {
                similarity: round3(hit.similarity),
                source_type: meta_str(&hit.metadata, SOURCE_TYPE)
                    .unwrap_or("unknown")
                    .to_string(),
                title: meta_str(&hit.metadata, TITLE)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Document {}", i + 1)),
                url: field(SOURCE_URL),
                file_path: field(FILE_PATH),
                repository: field(REPOSITORY),
                author: field(AUTHOR),
                preview: preview(&hit.text, preview_chars),
                source_number: i + 1,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Metadata;
    use serde_json::json;

    fn hit(title: Option<&str>, file: Option<&str>, similarity: f32) -> SearchHit {
        let mut metadata = Metadata::new();
        if let Some(t) = title {
            metadata.insert(TITLE.into(), json!(t));
        }
        if let Some(f) = file {
            metadata.insert(FILE_PATH.into(), json!(f));
        }
        SearchHit {
            id: "x".into(),
            similarity,
            text: "body".into(),
            metadata,
        }
    }

    #[test]
    fn test_marker_added_unless_heading_or_present() {
        assert!(bind_citations("plain", &[], 5).starts_with("🤖 **AI Response**\n\nplain"));
        assert_eq!(bind_citations("# Title\ntext", &[], 5), "# Title\ntext");
        let marked = format!("{RESPONSE_MARKER}\n\nx");
        assert_eq!(bind_citations(&marked, &[], 5), marked);
    }

    #[test]
    fn test_split_parts_sharing_a_title_are_each_cited() {
        let hits = vec![
            hit(Some("Install"), Some("docs/setup.md"), 0.9),
            hit(Some("Install"), Some("docs/setup.md"), 0.8),
        ];
        let out = bind_citations("# A\nRun the installer.", &hits, 5);
        assert!(out.contains("**Source 1:** Install (docs/setup.md)"));
        assert!(out.contains("**Source 2:** Install (docs/setup.md)"));
    }

    #[test]
    fn test_appends_missing_sources_once() {
        let hits = vec![
            hit(Some("Setup"), Some("docs/README.md"), 0.9),
            hit(Some("Usage"), None, 0.5),
            hit(None, None, 0.1),
        ];
        let out = bind_citations("# Answer\nAccording to Source 1, install deps.", &hits, 5);
        assert!(!out.contains("**Source 1:**"));
        assert!(out.ends_with("\n\n**Source 2:** Usage"));
        assert!(!out.contains("**Source 3:**"));
    }

    #[test]
    fn test_title_mention_counts_as_citation() {
        let hits = vec![hit(Some("Deploy Guide"), Some("docs/deploy.md"), 0.8)];
        let out = bind_citations("# A\nSee the Deploy Guide.", &hits, 5);
        assert_eq!(out, "# A\nSee the Deploy Guide.");

        let out = bind_citations("# A\nNothing cited.", &hits, 5);
        assert!(out.ends_with("**Source 1:** Deploy Guide (docs/deploy.md)"));
    }

    #[test]
    fn test_source_ten_is_not_source_one() {
        assert!(!mentions_label("see Source 10", 1));
        assert!(mentions_label("see Source 10", 10));
        assert!(mentions_label("Source 1.", 1));
    }

    #[test]
    fn test_only_top_sources_are_bound() {
        let hits: Vec<_> = (0..7).map(|i| hit(Some(&format!("T{i}")), None, 0.5)).collect();
        let out = bind_citations("# x", &hits, 5);
        assert!(out.contains("**Source 5:** T4"));
        assert!(!out.contains("**Source 6:**"));
    }

    #[test]
    fn test_build_sources_defaults_and_rounding() {
        let mut long = hit(None, None, 0.123456);
        long.text = "y".repeat(400);
        let sources = build_sources(&[hit(Some("A"), Some("a.rs"), 0.98765), long], 5, 300);

        assert_eq!(sources[0].similarity, 0.988);
        assert_eq!(sources[0].title, "A");
        assert_eq!(sources[0].file_path, "a.rs");
        assert_eq!(sources[0].source_type, "unknown");
        assert_eq!(sources[0].preview, "body");

        assert_eq!(sources[1].title, "Document 2");
        assert_eq!(sources[1].similarity, 0.123);
        assert_eq!(sources[1].preview.chars().count(), 303);
        assert!(sources[1].preview.ends_with("..."));
        assert_eq!(sources[1].source_number, 2);
        assert_eq!(sources[1].url, "");
    }
}
