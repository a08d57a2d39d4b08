//! Agent gateway trait and session handle

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{Result, ScoringFunction, ScoringRow, TurnEvent};

/// Stream of events produced by one agent turn
pub type TurnStream = BoxStream<'static, Result<TurnEvent>>;

/// Opaque handle to a conversation held by the model server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    label: String,
}

impl Session {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Trait for model-serving backends (e.g., a Llama Stack server)
///
/// The gateway owns the agent, its sessions and the streamed responses.
/// The retrieval pipeline only creates a session once, sends one message per
/// query and drains the returned stream. Scoring is used by the remote ranker.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Open a new session with a human readable label
    async fn create_session(&self, label: &str) -> Result<Session>;

    /// Send a user message within a session and stream back the turn events
    async fn create_turn(&self, session: &Session, message: &str) -> Result<TurnStream>;

    /// Score each row with the given scoring function, one scalar per row
    async fn score(&self, rows: Vec<ScoringRow>, function: &ScoringFunction) -> Result<Vec<f64>>;
}
