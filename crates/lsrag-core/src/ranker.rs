//! Relevance ranker trait

use async_trait::async_trait;

use crate::{Document, ScoredDocument};

/// Trait for relevance rankers
///
/// Rankers never fail: a strategy that cannot score degrades to some
/// ordering of the corpus instead of returning an error.
#[async_trait]
pub trait Ranker: Send + Sync {
    /// Short name used in logs and narration
    fn name(&self) -> &'static str;

    /// Order the whole corpus, highest score first, ties by index ascending
    async fn rank(&self, query: &str, documents: &[Document]) -> Vec<ScoredDocument>;

    /// The `min(k, documents.len())` best documents
    async fn top_k(&self, query: &str, documents: &[Document], k: usize) -> Vec<ScoredDocument> {
        let mut ranked = self.rank(query, documents).await;
        ranked.truncate(k);
        ranked
    }
}

/// Sort scored documents by descending score, breaking ties by index
///
/// Unscored entries sort after scored ones.
pub fn sort_by_score(scored: &mut [ScoredDocument]) {
    scored.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y
            .total_cmp(&x)
            .then_with(|| a.document_index.cmp(&b.document_index)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.document_index.cmp(&b.document_index),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PositionalRanker;

    #[async_trait]
    impl Ranker for PositionalRanker {
        fn name(&self) -> &'static str {
            "positional"
        }

        async fn rank(&self, _query: &str, documents: &[Document]) -> Vec<ScoredDocument> {
            (0..documents.len()).map(ScoredDocument::unscored).collect()
        }
    }

    fn corpus(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| Document::from_position(i, format!("doc {}", i), None))
            .collect()
    }

    #[tokio::test]
    async fn test_top_k_truncates_to_corpus_size() {
        let ranker = PositionalRanker;
        assert_eq!(ranker.top_k("q", &corpus(5), 3).await.len(), 3);
        assert_eq!(ranker.top_k("q", &corpus(2), 3).await.len(), 2);
        assert!(ranker.top_k("q", &corpus(0), 3).await.is_empty());
    }

    #[test]
    fn test_sort_by_score_ties_by_index() {
        let mut scored = vec![
            ScoredDocument::new(2, 1.0),
            ScoredDocument::unscored(0),
            ScoredDocument::new(1, 1.0),
            ScoredDocument::new(3, 2.5),
        ];
        sort_by_score(&mut scored);
        let order: Vec<usize> = scored.iter().map(|s| s.document_index).collect();
        assert_eq!(order, vec![3, 1, 2, 0]);
    }
}
