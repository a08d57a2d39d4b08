//! Core traits and types for lsrag
//!
//! This crate defines the data model shared by the retrieval pipeline and the
//! agent gateway. It provides capability-facing interfaces for the model server
//! (`AgentGateway`) and for relevance ranking (`Ranker`), so the pipeline can be
//! exercised against in-memory implementations in tests.

pub mod error;
pub mod gateway;
pub mod ranker;
pub mod types;

pub use error::{Error, Result};
pub use gateway::{AgentGateway, Session, TurnStream};
pub use ranker::{Ranker, sort_by_score};
pub use types::*;
