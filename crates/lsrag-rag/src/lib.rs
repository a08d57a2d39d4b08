//! Retrieval-augmented generation pipeline for lsrag
//!
//! This crate provides the corpus loader, the BM25 and remote-scoring rankers,
//! the prompt builder, the on-disk response cache and the query pipeline that
//! ties them to an agent gateway.

mod bm25;
mod cache;
mod config;
mod engine;
mod loader;
mod prompt;
mod remote;


pub use bm25::{Bm25Index, LexicalRanker};
pub use cache::{CACHE_FILE_NAME, ResponseCache};
pub use config::{PipelineConfig, RankerKind, parse_file_list};
pub use engine::{EventObserver, QueryOutcome, QueryReport, RagPipeline};
pub use loader::{Corpus, CorpusLoader};
pub use prompt::{DOCUMENT_SEPARATOR, MAX_TOKENS_IN_CONTEXT, Prompt, PromptBuilder};
pub use remote::{MAX_SCORED_CHARS, RemoteScoringRanker, ScoreOutcome, truncate_for_scoring};

// Re-export core types for convenience
pub use lsrag_core::{
    AgentGateway, Document, Error, Ranker, Result, ScoredDocument, Session, TurnEvent,
};
