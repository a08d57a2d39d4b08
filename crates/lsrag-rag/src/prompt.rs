//! Prompt construction from retrieved documents

use std::fmt;

/// Separator placed between retrieved documents in the context block
pub const DOCUMENT_SEPARATOR: &str = "\n\n----\n\n";

/// Advisory context size, only reported when exceeded
pub const MAX_TOKENS_IN_CONTEXT: usize = 4096;
const CHARS_PER_TOKEN: usize = 4;

/// Context block plus the user's query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub context: String,
    pub query: String,
}

impl Prompt {
    /// Rough token count of the rendered prompt
    pub fn estimated_tokens(&self) -> usize {
        self.to_string().chars().count().div_ceil(CHARS_PER_TOKEN)
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context:\n{}\n\nQuery: {}\n\nAnswer:", self.context, self.query)
    }
}

/// Builds prompts; same inputs always yield the same string
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    token_budget: usize,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            token_budget: MAX_TOKENS_IN_CONTEXT,
        }
    }

    pub fn with_token_budget(mut self, token_budget: usize) -> Self {
        self.token_budget = token_budget;
        self
    }

    pub fn prompt<S: AsRef<str>>(&self, query: &str, retrieved_texts: &[S]) -> Prompt {
        let context = retrieved_texts
            .iter()
            .map(|t| t.as_ref())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR);

        Prompt {
            context,
            query: query.to_string(),
        }
    }

    /// Render the final prompt string
    pub fn build<S: AsRef<str>>(&self, query: &str, retrieved_texts: &[S]) -> String {
        let prompt = self.prompt(query, retrieved_texts);
        let estimated = prompt.estimated_tokens();
        if estimated > self.token_budget {
            tracing::warn!(
                "Prompt is about {} tokens, over the advisory budget of {}",
                estimated,
                self.token_budget
            );
        }
        prompt.to_string()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
