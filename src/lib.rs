//! Lorekeeper: a retrieval-augmented onboarding assistant.
//!
//! Source code, markdown documentation and chat transcripts are split into
//! cited chunks ([`ingest`]), embedded ([`embed`]), kept in a snapshot-backed
//! vector store ([`store`]) and used as grounding context when answering
//! questions ([`rag`]).

pub mod cli;
pub mod config;
pub mod embed;
pub mod error;
pub mod generate;
pub mod ingest;
pub mod rag;
pub mod store;

pub use config::Config;
pub use embed::{create_embedder, Embedder, HashEmbedder, HttpEmbedder};
pub use error::{Error, Result};
pub use generate::{create_generator, Generator, OfflineGenerator, Prompt};
pub use ingest::{Chunk, Chunker, DocSource, DocType, Metadata, RepoRef, SlackMessage, SourceType};
pub use rag::{QueryResult, Retriever, SourceRef};
pub use store::{SearchHit, SnapshotStore, StoreStats, VectorEntry, VectorStore};
