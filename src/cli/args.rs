use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::ingest::{DocType, SourceType};

#[derive(Parser, Debug)]
#[command(name = "lorekeeper")]
#[command(about = "Ask grounded questions about your code, docs and team chat")]
#[command(version)]
pub struct Args {
    /// Config file (defaults to ./lorekeeper.toml, then the user config dir)
    #[arg(long, global = true, env = "LOREKEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Vector store snapshot file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk, embed and store content
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },

    /// Answer a question from the knowledge base
    Query {
        /// The question
        question: String,

        /// Only search one kind of content: code, documentation or slack
        #[arg(short = 't', long)]
        source_type: Option<SourceType>,

        /// Context budget in characters
        #[arg(long)]
        max_context: Option<usize>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what the store holds
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Remove one stored entry by id
    Delete { id: String },

    /// Remove every stored entry
    Clear,

    /// Load a small sample knowledge base
    Demo,
}

#[derive(Subcommand, Debug)]
pub enum IngestSource {
    /// Source files, or directories to walk (respects .gitignore)
    Code {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(long)]
        repository: Option<String>,

        #[arg(long)]
        branch: Option<String>,

        #[arg(long)]
        commit: Option<String>,
    },

    /// A documentation file
    Docs {
        file: PathBuf,

        /// Defaults to the file name
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// markdown, text, or any other name (chunked as plain text)
        #[arg(long, default_value = "markdown")]
        doc_type: DocType,
    },

    /// A JSON array of Slack messages ({user, text, ts, thread_ts?})
    Slack {
        file: PathBuf,

        #[arg(long)]
        channel: Option<String>,
    },
}
