//! Ranking through the server's scoring API

use std::sync::Arc;

use async_trait::async_trait;
use lsrag_core::{
    AgentGateway, Document, Ranker, ScoredDocument, ScoringFunction, ScoringRow, sort_by_score,
};

/// Documents are cut to this many characters before scoring
pub const MAX_SCORED_CHARS: usize = 1000;
const TRUNCATION_MARKER: &str = "...";

/// Result of asking the gateway for scores
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    /// One score per document, in corpus order
    Scored(Vec<f64>),
    /// Scoring could not be used; the reason is reported as a warning
    Fallback(String),
}

/// Ranker backed by the gateway's scoring capability
///
/// Any scoring failure degrades to the corpus order with undefined scores.
pub struct RemoteScoringRanker<G: AgentGateway> {
    gateway: Arc<G>,
    function: ScoringFunction,
}

impl<G: AgentGateway> RemoteScoringRanker<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            function: ScoringFunction::subset_of(),
        }
    }

    pub fn with_function(mut self, function: ScoringFunction) -> Self {
        self.function = function;
        self
    }

    /// Build rows and call the gateway, never failing
    pub async fn request_scores(&self, query: &str, documents: &[Document]) -> ScoreOutcome {
        let rows: Vec<ScoringRow> = documents
            .iter()
            .map(|doc| ScoringRow {
                input_query: query.to_string(),
                generated_answer: truncate_for_scoring(&doc.text),
                expected_answer: String::new(),
            })
            .collect();

        tracing::debug!(rows = rows.len(), function = %self.function.id, "calling scoring API");

        match self.gateway.score(rows, &self.function).await {
            Ok(scores) if scores.len() == documents.len() => ScoreOutcome::Scored(scores),
            Ok(scores) => ScoreOutcome::Fallback(format!(
                "expected {} scores, got {}",
                documents.len(),
                scores.len()
            )),
            Err(e) => ScoreOutcome::Fallback(e.to_string()),
        }
    }
}

#[async_trait]
impl<G: AgentGateway + 'static> Ranker for RemoteScoringRanker<G> {
    fn name(&self) -> &'static str {
        "remote-scoring"
    }

    async fn rank(&self, query: &str, documents: &[Document]) -> Vec<ScoredDocument> {
        if documents.is_empty() {
            return Vec::new();
        }

        match self.request_scores(query, documents).await {
            ScoreOutcome::Scored(scores) => {
                let mut scored: Vec<ScoredDocument> = scores
                    .into_iter()
                    .enumerate()
                    .map(|(i, score)| ScoredDocument::new(i, score))
                    .collect();
                sort_by_score(&mut scored);
                scored
            }
            ScoreOutcome::Fallback(reason) => {
                tracing::warn!("Scoring unavailable, using document order: {}", reason);
                (0..documents.len()).map(ScoredDocument::unscored).collect()
            }
        }
    }
}

/// Cut text to `MAX_SCORED_CHARS` characters, marking the cut
pub fn truncate_for_scoring(text: &str) -> String {
    match text.char_indices().nth(MAX_SCORED_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
