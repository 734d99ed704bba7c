use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lorekeeper::cli::{
    load_config, run_clear, run_delete, run_demo, run_ingest_code, run_ingest_docs,
    run_ingest_slack, run_query, run_stats, Args, Command, IngestSource, Workspace,
};
use lorekeeper::ingest::RepoRef;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        "lorekeeper=debug"
    } else {
        "lorekeeper=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;

    match args.command {
        Command::Stats { json } => run_stats(&config, json).await,
        Command::Delete { id } => run_delete(&config, &id).await,
        Command::Clear => run_clear(&config).await,
        Command::Demo => run_demo(&Workspace::open(config)?).await,
        Command::Query {
            question,
            source_type,
            max_context,
            json,
        } => {
            let workspace = Workspace::open(config)?;
            run_query(&workspace, &question, source_type, max_context, json).await
        }
        Command::Ingest { source } => {
            let workspace = Workspace::open(config)?;
            match source {
                IngestSource::Code {
                    paths,
                    repository,
                    branch,
                    commit,
                } => run_ingest_code(&workspace, &paths, RepoRef::new(repository, branch, commit)).await,
                IngestSource::Docs {
                    file,
                    title,
                    url,
                    author,
                    doc_type,
                } => run_ingest_docs(&workspace, &file, title, url, author, doc_type).await,
                IngestSource::Slack { file, channel } => {
                    run_ingest_slack(&workspace, &file, channel).await
                }
            }
        }
    }
}
