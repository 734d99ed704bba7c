use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Provenance metadata attached to chunks and stored vectors.
pub type Metadata = BTreeMap<String, Value>;

pub const SOURCE_TYPE: &str = "source_type";
pub const TITLE: &str = "title";
pub const SOURCE_URL: &str = "source_url";
pub const FILE_PATH: &str = "file_path";
pub const REPOSITORY: &str = "repository";
pub const AUTHOR: &str = "author";

/// Coarse content category used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Code,
    Documentation,
    Slack,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Code => "code",
            SourceType::Documentation => "documentation",
            SourceType::Slack => "slack",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Ok(SourceType::Code),
            "documentation" | "docs" | "doc" => Ok(SourceType::Documentation),
            "slack" | "chat" => Ok(SourceType::Slack),
            other => Err(Error::invalid_input(format!(
                "unknown source type '{other}' (expected code, documentation or slack)"
            ))),
        }
    }
}

/// A unit of text plus the metadata needed to cite it later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    pub fn source_type(&self) -> Option<&str> {
        meta_str(&self.metadata, SOURCE_TYPE)
    }

    pub fn title(&self) -> Option<&str> {
        meta_str(&self.metadata, TITLE)
    }

    pub fn source_url(&self) -> Option<&str> {
        meta_str(&self.metadata, SOURCE_URL)
    }
}

/// String value of a metadata field, if present and a string.
pub fn meta_str<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(Value::as_str)
}

pub(crate) fn put(metadata: &mut Metadata, key: &str, value: impl Into<Value>) {
    metadata.insert(key.to_string(), value.into());
}

/// Inserts `value` only when it is present and non-blank.
pub(crate) fn put_opt(metadata: &mut Metadata, key: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        metadata.insert(key.to_string(), Value::String(v.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_round_trip_strings() {
        for st in [SourceType::Code, SourceType::Documentation, SourceType::Slack] {
            assert_eq!(st.as_str().parse::<SourceType>().unwrap(), st);
        }
        assert_eq!("Docs".parse::<SourceType>().unwrap(), SourceType::Documentation);
    }

    #[test]
    fn test_source_type_rejects_unknown() {
        let err = "pdf".parse::<SourceType>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_put_opt_skips_blank() {
        let mut meta = Metadata::new();
        put_opt(&mut meta, AUTHOR, Some("  "));
        put_opt(&mut meta, REPOSITORY, None);
        put_opt(&mut meta, TITLE, Some("Setup"));
        assert_eq!(meta.len(), 1);
        assert_eq!(meta_str(&meta, TITLE), Some("Setup"));
    }
}
