//! Common types used across lsrag

use serde::{Deserialize, Serialize};

/// A plain-text document loaded from the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub source: Option<String>,
}

impl Document {
    /// Create a document whose id is derived from its position in the configured path list
    pub fn from_position(position: usize, text: String, source: Option<String>) -> Self {
        Self {
            id: format!("num-{}", position),
            text,
            source,
        }
    }
}

/// A ranked reference into the corpus
///
/// `score` is `None` when the ranker could not score the document, which
/// happens when remote scoring falls back to positional order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document_index: usize,
    pub score: Option<f64>,
}

impl ScoredDocument {
    pub fn new(document_index: usize, score: f64) -> Self {
        Self {
            document_index,
            score: Some(score),
        }
    }

    pub fn unscored(document_index: usize) -> Self {
        Self {
            document_index,
            score: None,
        }
    }
}

/// One event of a streamed agent turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEvent {
    /// Step notices such as "inference started"
    Log(String),
    /// Incremental text produced while the turn is running
    Delta(String),
    /// Final answer text of the turn
    Content(String),
}

impl TurnEvent {
    /// The `Content` payload, if any, skipping empty strings
    pub fn content(&self) -> Option<&str> {
        match self {
            TurnEvent::Content(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

/// A row submitted to the scoring API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRow {
    pub input_query: String,
    pub generated_answer: String,
    pub expected_answer: String,
}

/// A scoring function identifier together with its optional parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringFunction {
    pub id: String,
    pub params: Option<serde_json::Value>,
}

impl ScoringFunction {
    pub const SUBSET_OF: &'static str = "basic::subset_of";

    /// The subset/overlap scorer used for remote ranking
    pub fn subset_of() -> Self {
        Self {
            id: Self::SUBSET_OF.to_string(),
            params: None,
        }
    }
}

impl Default for ScoringFunction {
    fn default() -> Self {
        Self::subset_of()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_from_position() {
        let doc = Document::from_position(2, "text".to_string(), Some("a.rst".to_string()));
        assert_eq!(doc.id, "num-2");
        assert_eq!(doc.source.as_deref(), Some("a.rst"));
    }

    #[test]
    fn test_turn_event_content_skips_blank() {
        assert_eq!(TurnEvent::Content("Paris".to_string()).content(), Some("Paris"));
        assert_eq!(TurnEvent::Content("  ".to_string()).content(), None);
        assert_eq!(TurnEvent::Delta("Paris".to_string()).content(), None);
    }

    #[test]
    fn test_scoring_function_default() {
        let function = ScoringFunction::default();
        assert_eq!(function.id, "basic::subset_of");
        assert!(function.params.is_none());
    }
}
