//! Error types for lsrag

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the retrieval demo
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} not found. Skipping...")]
    MissingDocument(String),

    #[error("Scoring unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Failed to persist response cache: {0}")]
    CachePersist(String),

    #[error("Invalid UTF-8 in {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
