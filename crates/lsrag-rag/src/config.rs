//! Retrieval pipeline configuration

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use lsrag_core::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CORPUS_FILE: &str = "documents/kubecon-schedule.rst";
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_CACHE_DIR: &str = "demo_cache";
pub const DEFAULT_SESSION_LABEL: &str = "rag-demo-session";

/// Which ranking strategy the pipeline uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankerKind {
    /// Local BM25
    #[default]
    Lexical,
    /// The server's scoring API with positional fallback
    Remote,
}

impl FromStr for RankerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lexical" | "bm25" => Ok(RankerKind::Lexical),
            "remote" | "scoring" => Ok(RankerKind::Remote),
            other => Err(Error::Configuration(format!(
                "Unknown ranker '{}', expected 'lexical' or 'remote'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for RankerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankerKind::Lexical => write!(f, "lexical"),
            RankerKind::Remote => write!(f, "remote"),
        }
    }
}

/// Settings read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub corpus_files: Vec<PathBuf>,
    pub top_k: usize,
    pub cache_dir: PathBuf,
    pub ranker: RankerKind,
    pub use_cache: bool,
    pub session_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            corpus_files: vec![PathBuf::from(DEFAULT_CORPUS_FILE)],
            top_k: DEFAULT_TOP_K,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            ranker: RankerKind::default(),
            use_cache: true,
            session_label: DEFAULT_SESSION_LABEL.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, defaults for absent keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(files) = lookup("RAG_CORPUS_FILES") {
            config.corpus_files = parse_file_list(&files);
        }

        if let Some(top_k) = lookup("RAG_TOP_K") {
            config.top_k = top_k.trim().parse().map_err(|_| {
                Error::Configuration(format!("RAG_TOP_K must be a positive integer, got '{}'", top_k))
            })?;
        }

        if let Some(dir) = lookup("RAG_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        if let Some(ranker) = lookup("RAG_RANKER") {
            config.ranker = ranker.parse()?;
        }

        Ok(config)
    }
}

/// Comma-separated paths, blanks dropped
pub fn parse_file_list(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
