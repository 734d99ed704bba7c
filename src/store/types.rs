use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ingest::{meta_str, Metadata, SOURCE_TYPE};

/// A stored vector with the chunk text and metadata it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl VectorEntry {
    pub fn source_type(&self) -> Option<&str> {
        meta_str(&self.metadata, SOURCE_TYPE)
    }
}

/// Input for a new entry; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

impl NewEntry {
    pub fn new(text: impl Into<String>, vector: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            vector,
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub similarity: f32,
    pub text: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_vectors: usize,
    /// Entry count per `source_type`; entries without one count as `unknown`.
    pub source_types: BTreeMap<String, usize>,
    pub storage_path: String,
    pub dimension: Option<usize>,
    pub size_bytes: u64,
}
