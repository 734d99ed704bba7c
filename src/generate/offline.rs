use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Generator, Prompt, RESPONSE_MARKER};
use crate::error::Result;

static SOURCE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\[Source (\d+)\](.*)$").unwrap());
static HEADER_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Title: ([^|]+)").unwrap());
static QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\*\*Question:\*\*\s*(.+)$").unwrap());

/// Demo-mode generator used when no model is configured.
///
/// Lists the labeled sources present in the prompt instead of writing an
/// answer, so retrieval and citations still work without network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    fn sources(prompt: &Prompt) -> Vec<(String, String)> {
        let mut seen = Vec::new();
        for text in [&prompt.system, &prompt.user] {
            for caps in SOURCE_HEADER.captures_iter(text) {
                let number = caps[1].to_string();
                if seen.iter().any(|(n, _)| *n == number) {
                    continue;
                }
                let title = HEADER_TITLE
                    .captures(&caps[2])
                    .map(|t| t[1].trim().to_string())
                    .unwrap_or_default();
                seen.push((number, title));
            }
        }
        seen
    }
}

#[async_trait]
impl Generator for OfflineGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let question = QUESTION
            .captures(&prompt.user)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| prompt.user.trim().to_string());
        let sources = Self::sources(prompt);

        let mut out = format!("{RESPONSE_MARKER}\n\n_Demo mode_\n\n");
        out.push_str(
            "No generation model is configured, so this reply lists the most relevant \
             knowledge base entries instead of a written answer.\n\n",
        );
        out.push_str(&format!("**Your Question:** {question}\n\n"));

        if sources.is_empty() {
            out.push_str("No labeled sources were found in the context.");
        } else {
            out.push_str(&format!("**Relevant sources ({}):**\n", sources.len()));
            for (number, title) in &sources {
                if title.is_empty() {
                    out.push_str(&format!("- Source {number}\n"));
                } else {
                    out.push_str(&format!("- Source {number}: {title}\n"));
                }
            }
            out.push_str("\nConfigure a generator (for example set OPENAI_API_KEY) for full answers.");
        }
        Ok(out)
    }

    fn model_name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lists_sources_and_question() {
        let system = "Context:\n[Source 1] Type: documentation | Title: Setup | File: docs/README.md\n# Setup\n\n---\n[Source 2] Type: code | Title: function: main in main.rs\nfn main() {}\n";
        let user = "Please answer.\n\n**Question:** How do I set up?\n";
        let answer = OfflineGenerator
            .generate(&Prompt::new(system, user))
            .await
            .unwrap();

        assert!(answer.starts_with(RESPONSE_MARKER));
        assert_eq!(answer.matches("🤖").count(), 1);
        assert!(answer.contains("**Your Question:** How do I set up?"));
        assert!(answer.contains("- Source 1: Setup\n"));
        assert!(answer.contains("- Source 2: function: main in main.rs\n"));
    }

    #[tokio::test]
    async fn test_no_sources() {
        let answer = OfflineGenerator
            .generate(&Prompt::new("", "what?"))
            .await
            .unwrap();
        assert!(answer.contains("**Your Question:** what?"));
        assert!(answer.contains("No labeled sources"));
    }
}
