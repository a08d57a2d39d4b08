//! Llama Stack client implementation

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use lsrag_core::{
    AgentGateway, Error, Result, ScoringFunction, ScoringRow, Session, TurnStream,
};

use crate::config::LlamaStackConfig;
use crate::sse::decode_events;

/// Llama Stack agent client
pub struct LlamaStackClient {
    config: LlamaStackConfig,
    agent_id: Option<String>,
    client: Client,
}

#[derive(Serialize)]
struct AgentConfig<'a> {
    model: &'a str,
    instructions: &'a str,
    enable_session_persistence: bool,
}

#[derive(Serialize)]
struct CreateAgentRequest<'a> {
    agent_config: AgentConfig<'a>,
}

#[derive(Deserialize)]
struct CreateAgentResponse {
    agent_id: String,
}

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    session_name: &'a str,
}

#[derive(Deserialize)]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateTurnRequest<'a> {
    messages: Vec<UserMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    input_rows: &'a [ScoringRow],
    scoring_functions: HashMap<&'a str, Option<&'a Value>>,
}

#[derive(Deserialize)]
struct ScoreRow {
    score: Value,
}

#[derive(Deserialize)]
struct ScoringResult {
    score_rows: Vec<ScoreRow>,
}

#[derive(Deserialize)]
struct ScoreResponse {
    results: HashMap<String, ScoringResult>,
}

impl LlamaStackClient {
    /// Create a new client from configuration
    pub fn new(config: LlamaStackConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            agent_id: None,
            client,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = LlamaStackConfig::from_env()?;
        Self::new(config)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Register the agent on the server
    ///
    /// Must be called before sessions can be created.
    pub async fn connect(&mut self) -> Result<()> {
        let request = CreateAgentRequest {
            agent_config: AgentConfig {
                model: &self.config.model,
                instructions: &self.config.instructions,
                enable_session_persistence: false,
            },
        };

        let response: CreateAgentResponse = self.post_json("v1/agents", &request).await?;
        tracing::debug!(agent_id = %response.agent_id, model = %self.config.model, "agent registered");
        self.agent_id = Some(response.agent_id);

        Ok(())
    }

    fn agent_id(&self) -> Result<&str> {
        self.agent_id
            .as_deref()
            .ok_or_else(|| Error::Configuration("Agent not registered. Call connect() first.".to_string()))
    }

    async fn send<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let url = self.config.endpoint(path);
        tracing::debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(e.to_string())
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Network(format!(
                "Llama Stack request to {} failed with status {}: {}",
                path, status, error_text
            )));
        }

        Ok(response)
    }

    async fn post_json<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        self.send(path, body)
            .await?
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[async_trait]
impl AgentGateway for LlamaStackClient {
    async fn create_session(&self, label: &str) -> Result<Session> {
        let path = format!("v1/agents/{}/session", self.agent_id()?);
        let response: CreateSessionResponse = self
            .post_json(&path, &CreateSessionRequest { session_name: label })
            .await?;

        Ok(Session::new(response.session_id, label))
    }

    async fn create_turn(&self, session: &Session, message: &str) -> Result<TurnStream> {
        let path = format!("v1/agents/{}/session/{}/turn", self.agent_id()?, session.id());
        let request = CreateTurnRequest {
            messages: vec![UserMessage {
                role: "user",
                content: message,
            }],
            stream: true,
        };

        let response = self.send(&path, &request).await?;
        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| Error::Network(e.to_string()))
            })
            .boxed();

        Ok(decode_events(body))
    }

    async fn score(&self, rows: Vec<ScoringRow>, function: &ScoringFunction) -> Result<Vec<f64>> {
        let mut scoring_functions = HashMap::new();
        scoring_functions.insert(function.id.as_str(), function.params.as_ref());

        let request = ScoreRequest {
            input_rows: &rows,
            scoring_functions,
        };

        let mut response: ScoreResponse = self.post_json("v1/scoring/score", &request).await?;
        let result = response.results.remove(&function.id).ok_or_else(|| {
            Error::ScoringUnavailable(format!("no results for scoring function {}", function.id))
        })?;

        result
            .score_rows
            .iter()
            .map(|row| score_value(&row.score))
            .collect()
    }
}

/// Scores come back as numbers, booleans or numeric strings
pub(crate) fn score_value(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::ScoringUnavailable(format!("score out of range: {}", n))),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|score| score.is_finite())
            .ok_or_else(|| Error::ScoringUnavailable(format!("non-numeric score: {}", s))),
        other => Err(Error::ScoringUnavailable(format!("unexpected score: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_value_shapes() {
        assert_eq!(score_value(&json!(0.5)).unwrap(), 0.5);
        assert_eq!(score_value(&json!(1)).unwrap(), 1.0);
        assert_eq!(score_value(&json!(true)).unwrap(), 1.0);
        assert_eq!(score_value(&json!(" 0.25 ")).unwrap(), 0.25);
        assert!(score_value(&json!(null)).is_err());
        assert!(score_value(&json!("high")).is_err());
    }

    #[test]
    fn test_non_finite_score_strings_rejected() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity", " Infinity "] {
            let err = score_value(&json!(raw)).unwrap_err();
            assert!(matches!(err, Error::ScoringUnavailable(_)), "{}", raw);
        }
        assert_eq!(score_value(&json!("1e3")).unwrap(), 1000.0);
    }

    #[tokio::test]
    async fn test_session_requires_connect() {
        let client = LlamaStackClient::new(LlamaStackConfig::new("http://localhost:8321", "m")).unwrap();
        let err = client.create_session("rag-demo-session").await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = LlamaStackConfig::new("localhost:8321", "m");
        assert!(LlamaStackClient::new(config).is_err());
    }
}
