use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the retrieval pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied something the pipeline cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The embedding backend failed or returned an unusable response.
    #[error("embedding provider error: {0}")]
    Embedding(String),

    /// The generation backend failed or returned an unusable response.
    #[error("generation provider error: {0}")]
    Generation(String),

    #[error("vector dimension mismatch: store holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding model mismatch: store holds vectors from '{expected}', got '{actual}'")]
    ModelMismatch { expected: String, actual: String },

    #[error("vector store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Provider-side failures, as opposed to caller mistakes or local storage faults.
    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            Error::Embedding(_) | Error::Generation(_) | Error::Http(_)
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = Error::DimensionMismatch {
            expected: 768,
            actual: 1536,
        };
        assert_eq!(
            err.to_string(),
            "vector dimension mismatch: store holds 768-dimensional vectors, got 1536"
        );
    }

    #[test]
    fn test_is_provider() {
        assert!(Error::Embedding("rate limited".into()).is_provider());
        assert!(Error::Generation("boom".into()).is_provider());
        assert!(!Error::invalid_input("empty query").is_provider());
        assert!(!Error::Store("disk full".into()).is_provider());
    }
}
