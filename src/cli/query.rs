use anyhow::Result;
use console::{style, Emoji};

use super::{Workspace, ERROR};
use crate::ingest::SourceType;
use crate::rag::QueryResult;

static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "");
static FILE: Emoji<'_, '_> = Emoji("📄 ", "");

pub async fn run_query(
    workspace: &Workspace,
    question: &str,
    source_type: Option<SourceType>,
    max_context: Option<usize>,
    json: bool,
) -> Result<()> {
    let result = workspace
        .retriever
        .answer(question, source_type, max_context)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(question, &result);
    }

    if !result.success {
        anyhow::bail!(result.error.unwrap_or_else(|| "query failed".to_string()));
    }
    Ok(())
}

fn print_result(question: &str, result: &QueryResult) {
    println!("\n{}{}\n", SEARCH, style(question).yellow().bold());
    if !result.success {
        println!("{}{}", ERROR, style(&result.response).red());
        return;
    }
    println!("{}\n", result.response);

    if result.sources.is_empty() {
        return;
    }
    println!("{}", style("Sources").bold().underlined());
    for source in &result.sources {
        let location = [&source.file_path, &source.url]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("");
        println!(
            "{} {}. {} {}",
            FILE,
            style(source.source_number).dim(),
            style(&source.title).green(),
            style(location).dim()
        );
        println!(
            "   Similarity: {} | Type: {}",
            style(format!("{:.3}", source.similarity)).cyan(),
            source.source_type
        );
    }
    println!(
        "\n{}",
        style(format!(
            "{} sources in context, {:.2}s",
            result.context_used, result.processing_time
        ))
        .dim()
    );
}
