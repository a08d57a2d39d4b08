//! Llama Stack configuration

use lsrag_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

pub const DEFAULT_PORT: &str = "8321";
pub const DEFAULT_MODEL: &str = "/mnt/models/model.file";
pub const DEFAULT_INSTRUCTIONS: &str = "You should answer questions based on the provided context.";
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

/// Configuration for the Llama Stack client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlamaStackConfig {
    pub base_url: String,
    pub model: String,
    pub instructions: String,
    pub timeout_secs: u64,
}

impl LlamaStackConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let endpoint = env::var("LLAMA_STACK_ENDPOINT").ok();
        let port = env::var("LLAMA_STACK_PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        let model = env::var("INFERENCE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = match env::var("LLAMA_STACK_TIMEOUT_SECS") {
            Ok(value) => value.parse().map_err(|_| {
                Error::Configuration(format!(
                    "LLAMA_STACK_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    value
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            base_url: resolve_base_url(endpoint.as_deref(), &port),
            model,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration with explicit values
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Check that the base URL parses as an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            Error::Configuration(format!("Invalid server URL '{}': {}", self.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Configuration(format!(
                "Server URL must use http or https, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Join an API path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// An explicit endpoint wins over the local port
pub fn resolve_base_url(endpoint: Option<&str>, port: &str) -> String {
    match endpoint {
        Some(endpoint) if !endpoint.trim().is_empty() => endpoint.trim().to_string(),
        _ => format!("http://localhost:{}", port),
    }
}
