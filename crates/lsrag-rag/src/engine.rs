//! Query pipeline: cache check, retrieval, prompt, generation, cache store

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use lsrag_core::{
    AgentGateway, Error, Ranker, Result, ScoredDocument, Session, TurnEvent,
};

use crate::cache::ResponseCache;
use crate::loader::{Corpus, CorpusLoader};
use crate::prompt::PromptBuilder;

/// Callback receiving every turn event as the stream is drained
pub type EventObserver = Box<dyn Fn(&TurnEvent) + Send + Sync>;

/// Terminal state of one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Cached(String),
    Generated(String),
    /// User-visible error text; the cache is left untouched
    Failed(String),
}

impl QueryOutcome {
    /// The text to show the user, whatever the outcome
    pub fn text(&self) -> &str {
        match self {
            QueryOutcome::Cached(text) | QueryOutcome::Generated(text) | QueryOutcome::Failed(text) => text,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, QueryOutcome::Cached(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }
}

/// What happened while answering one query
#[derive(Debug, Clone)]
pub struct QueryReport {
    pub query: String,
    pub outcome: QueryOutcome,
    /// Empty on a cache hit
    pub matches: Vec<ScoredDocument>,
    /// `None` on a cache hit
    pub prompt: Option<String>,
    pub retrieval_time: Duration,
    pub generation_time: Duration,
    /// Set when a generated answer could not be written to the cache file
    pub persist_error: Option<String>,
}

impl QueryReport {
    fn cached(query: &str, answer: String) -> Self {
        Self {
            query: query.to_string(),
            outcome: QueryOutcome::Cached(answer),
            matches: Vec::new(),
            prompt: None,
            retrieval_time: Duration::ZERO,
            generation_time: Duration::ZERO,
            persist_error: None,
        }
    }

    /// Whether a generated answer reached the cache file
    pub fn is_persisted(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Generated(_)) && self.persist_error.is_none()
    }
}

/// Retrieval-augmented answering over a fixed corpus and one agent session
pub struct RagPipeline<G: AgentGateway> {
    gateway: Arc<G>,
    session: Session,
    ranker: Box<dyn Ranker>,
    loader: CorpusLoader,
    corpus: Corpus,
    prompt_builder: PromptBuilder,
    cache: ResponseCache,
    top_k: usize,
    use_cache: bool,
    observer: Option<EventObserver>,
}

impl<G: AgentGateway> RagPipeline<G> {
    /// Load the corpus and assemble the pipeline around an open session
    pub fn new(
        gateway: Arc<G>,
        session: Session,
        ranker: Box<dyn Ranker>,
        loader: CorpusLoader,
        cache: ResponseCache,
    ) -> Result<Self> {
        let corpus = loader.load()?;

        Ok(Self {
            gateway,
            session,
            ranker,
            loader,
            corpus,
            prompt_builder: PromptBuilder::new(),
            cache,
            top_k: crate::config::DEFAULT_TOP_K,
            use_cache: true,
            observer: None,
        })
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// When off, every query is generated; answers are still stored
    pub fn with_cache_lookup(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_prompt_builder(mut self, prompt_builder: PromptBuilder) -> Self {
        self.prompt_builder = prompt_builder;
        self
    }

    pub fn with_event_observer(mut self, observer: EventObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn ranker_name(&self) -> &'static str {
        self.ranker.name()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Re-read the configured corpus files
    pub fn reload_corpus(&mut self) -> Result<()> {
        self.corpus = self.loader.load()?;
        Ok(())
    }

    /// Top-k documents for a query, no generation
    pub async fn retrieve(&self, query: &str) -> Vec<ScoredDocument> {
        self.ranker
            .top_k(query, self.corpus.documents(), self.top_k)
            .await
    }

    /// Render the prompt for already retrieved matches
    pub fn build_prompt(&self, query: &str, matches: &[ScoredDocument]) -> String {
        let texts: Vec<&str> = matches
            .iter()
            .map(|m| self.corpus.documents()[m.document_index].text.as_str())
            .collect();
        self.prompt_builder.build(query, &texts)
    }

    /// Run one query to a terminal state
    pub async fn answer(&mut self, query: &str) -> QueryReport {
        if self.use_cache {
            if let Some(answer) = self.cache.get(query) {
                tracing::debug!(query, "cache hit");
                return QueryReport::cached(query, answer.to_string());
            }
        }

        let started = Instant::now();
        let matches = self.retrieve(query).await;
        let retrieval_time = started.elapsed();

        let prompt = self.build_prompt(query, &matches);

        let started = Instant::now();
        let generated = self.generate(&prompt).await;
        let generation_time = started.elapsed();

        let mut persist_error = None;
        let outcome = match generated {
            Ok(answer) => {
                if let Err(e) = self.cache.put(query, answer.clone()).await {
                    tracing::warn!("{}", e);
                    persist_error = Some(e.to_string());
                }
                QueryOutcome::Generated(answer)
            }
            Err(e) => {
                tracing::error!("Generation failed for query '{}': {}", query, e);
                QueryOutcome::Failed(format!("Error: {}", e))
            }
        };

        QueryReport {
            query: query.to_string(),
            outcome,
            matches,
            prompt: Some(prompt),
            retrieval_time,
            generation_time,
            persist_error,
        }
    }

    /// Send the prompt and drain the turn stream
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut stream = self.gateway.create_turn(&self.session, prompt).await?;

        let mut final_content: Option<String> = None;
        let mut deltas = String::new();

        while let Some(event) = stream.next().await {
            let event = event?;
            if let Some(observer) = &self.observer {
                observer(&event);
            }
            match &event {
                TurnEvent::Content(_) => {
                    if let Some(text) = event.content() {
                        final_content = Some(text.to_string());
                    }
                }
                TurnEvent::Delta(text) => deltas.push_str(text),
                TurnEvent::Log(_) => {}
            }
        }

        match final_content {
            Some(content) => Ok(content),
            None if !deltas.trim().is_empty() => Ok(deltas),
            None => Err(Error::GenerationFailure(
                "the agent returned no content".to_string(),
            )),
        }
    }
}
