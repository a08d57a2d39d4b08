//! BM25 lexical ranking

use std::collections::HashMap;

use async_trait::async_trait;
use lsrag_core::{Document, Ranker, ScoredDocument, sort_by_score};

pub const DEFAULT_K1: f64 = 1.5;
pub const DEFAULT_B: f64 = 0.75;

/// Term statistics for one corpus
#[derive(Debug, Clone)]
pub struct Bm25Index {
    k1: f64,
    b: f64,
    term_frequencies: Vec<HashMap<String, usize>>,
    doc_lengths: Vec<usize>,
    doc_frequencies: HashMap<String, usize>,
    avg_doc_length: f64,
}

impl Bm25Index {
    /// Whitespace tokenization, no stemming or stopword removal
    pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
        text.split_whitespace()
    }

    pub fn build<S: AsRef<str>>(texts: &[S], k1: f64, b: f64) -> Self {
        let mut term_frequencies = Vec::with_capacity(texts.len());
        let mut doc_lengths = Vec::with_capacity(texts.len());
        let mut doc_frequencies: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let mut frequencies: HashMap<String, usize> = HashMap::new();
            let mut length = 0;
            for token in Self::tokenize(text.as_ref()) {
                *frequencies.entry(token.to_string()).or_default() += 1;
                length += 1;
            }
            for term in frequencies.keys() {
                *doc_frequencies.entry(term.clone()).or_default() += 1;
            }
            term_frequencies.push(frequencies);
            doc_lengths.push(length);
        }

        let total: usize = doc_lengths.iter().sum();
        let avg_doc_length = if texts.is_empty() {
            0.0
        } else {
            total as f64 / texts.len() as f64
        };

        Self {
            k1,
            b,
            term_frequencies,
            doc_lengths,
            doc_frequencies,
            avg_doc_length,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    /// Smoothed idf, positive even for terms present in every document
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.len() as f64;
        let df = self.doc_frequencies.get(term).copied().unwrap_or(0) as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Score of every document for the query, in corpus order
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let avg = if self.avg_doc_length > 0.0 {
            self.avg_doc_length
        } else {
            1.0
        };
        let query_terms: Vec<(&str, f64)> = Self::tokenize(query)
            .map(|term| (term, self.idf(term)))
            .collect();

        self.term_frequencies
            .iter()
            .zip(&self.doc_lengths)
            .map(|(frequencies, &length)| {
                let norm = self.k1 * (1.0 - self.b + self.b * length as f64 / avg);
                query_terms
                    .iter()
                    .map(|(term, idf)| {
                        let tf = frequencies.get(*term).copied().unwrap_or(0) as f64;
                        idf * tf * (self.k1 + 1.0) / (tf + norm)
                    })
                    .sum()
            })
            .collect()
    }
}

/// Local BM25 ranking over whitespace tokens
#[derive(Debug, Clone, Copy)]
pub struct LexicalRanker {
    k1: f64,
    b: f64,
}

impl LexicalRanker {
    pub fn new() -> Self {
        Self::with_params(DEFAULT_K1, DEFAULT_B)
    }

    pub fn with_params(k1: f64, b: f64) -> Self {
        Self { k1, b }
    }
}

impl Default for LexicalRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ranker for LexicalRanker {
    fn name(&self) -> &'static str {
        "bm25"
    }

    async fn rank(&self, query: &str, documents: &[Document]) -> Vec<ScoredDocument> {
        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let index = Bm25Index::build(&texts, self.k1, self.b);

        let mut scored: Vec<ScoredDocument> = index
            .scores(query)
            .into_iter()
            .enumerate()
            .map(|(i, score)| ScoredDocument::new(i, score))
            .collect();
        sort_by_score(&mut scored);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<Document> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Document::from_position(i, t.to_string(), None))
            .collect()
    }

    #[tokio::test]
    async fn test_selects_matching_capital() {
        let corpus = docs(&[
            "The capital of France is Paris.",
            "Berlin is the capital of Germany.",
        ]);
        let top = LexicalRanker::new().top_k("capital of France", &corpus, 1).await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].document_index, 0);
        assert!(top[0].score.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_more_occurrences_never_score_lower() {
        let corpus = docs(&[
            "paris filler filler filler",
            "paris paris filler filler",
            "paris paris paris filler",
        ]);
        let scores = Bm25Index::build(
            &corpus.iter().map(|d| d.text.as_str()).collect::<Vec<_>>(),
            DEFAULT_K1,
            DEFAULT_B,
        )
        .scores("paris");
        assert!(scores[1] >= scores[0]);
        assert!(scores[2] >= scores[1]);
    }

    #[tokio::test]
    async fn test_ranking_is_deterministic_with_index_tiebreak() {
        let corpus = docs(&["same words here", "unrelated text", "same words here"]);
        let ranker = LexicalRanker::new();

        let first = ranker.rank("same words", &corpus).await;
        let second = ranker.rank("same words", &corpus).await;
        assert_eq!(first, second);

        let order: Vec<usize> = first.iter().map(|s| s.document_index).collect();
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[tokio::test]
    async fn test_top_k_bounds() {
        let corpus = docs(&["a b", "b c", "c d", "d e"]);
        let ranker = LexicalRanker::new();

        for k in 0..6 {
            let top = ranker.top_k("b c", &corpus, k).await;
            assert_eq!(top.len(), k.min(corpus.len()));
            let mut indices: Vec<usize> = top.iter().map(|s| s.document_index).collect();
            indices.sort_unstable();
            indices.dedup();
            assert_eq!(indices.len(), top.len());
            assert!(indices.iter().all(|&i| i < corpus.len()));
        }
    }

    #[tokio::test]
    async fn test_empty_corpus_and_empty_query() {
        let ranker = LexicalRanker::new();
        assert!(ranker.rank("anything", &[]).await.is_empty());

        let corpus = docs(&["one", ""]);
        let ranked = ranker.rank("", &corpus).await;
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|s| s.score == Some(0.0)));
    }

    #[test]
    fn test_idf_positive_for_common_terms() {
        let index = Bm25Index::build(&["a b", "a c"], DEFAULT_K1, DEFAULT_B);
        assert!(index.idf("a") > 0.0);
        assert!(index.idf("b") > index.idf("a"));
    }
}
