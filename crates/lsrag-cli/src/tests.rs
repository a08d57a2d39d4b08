//! Tests for console formatting helpers

#[cfg(test)]
mod formatting_tests {
    use crate::{cache_status, format_match, preview};
    use lsrag_core::ScoredDocument;
    use lsrag_rag::{QueryOutcome, QueryReport};
    use std::time::Duration;

    fn generated_report(persist_error: Option<String>) -> QueryReport {
        QueryReport {
            query: "capital of France".to_string(),
            outcome: QueryOutcome::Generated("Paris".to_string()),
            matches: vec![ScoredDocument::new(0, 0.5)],
            prompt: Some("Context:\n...".to_string()),
            retrieval_time: Duration::ZERO,
            generation_time: Duration::ZERO,
            persist_error,
        }
    }

    #[test]
    fn test_preview_flattens_newlines() {
        assert_eq!(preview("Day 1\nKeynote"), "Day 1 Keynote...");
    }

    #[test]
    fn test_preview_truncates_by_characters() {
        let text = "ü".repeat(80);
        let shown = preview(&text);
        assert_eq!(shown.chars().count(), 53);
    }

    #[test]
    fn test_format_scored_match() {
        let line = format_match(0, &ScoredDocument::new(3, 1.23456), "AI agents demo\nRoom 7");
        assert_eq!(line, "  #1: Score 1.23 - AI agents demo Room 7...");
    }

    #[test]
    fn test_format_unscored_match() {
        let line = format_match(2, &ScoredDocument::unscored(0), "Keynote");
        assert_eq!(line, "  #3: Score n/a - Keynote...");
    }

    #[test]
    fn test_cache_status_confirms_persisted_answer() {
        assert_eq!(
            cache_status(&generated_report(None)),
            "✓ Response cached for future use"
        );
    }

    #[test]
    fn test_cache_status_reports_write_failure() {
        let report = generated_report(Some(
            "Failed to persist response cache: cache/response_cache.json: Permission denied".to_string(),
        ));
        let status = cache_status(&report);
        assert!(status.starts_with("Response not cached: Failed to persist"));
        assert!(!status.contains('✓'));
    }
}
