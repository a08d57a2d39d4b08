//! Llama Stack integration for lsrag
//!
//! This crate provides the Llama Stack implementation of the AgentGateway trait.

mod client;
mod config;
mod sse;


pub use client::LlamaStackClient;
pub use config::{LlamaStackConfig, resolve_base_url};
pub use sse::{decode_events, parse_event_line};

// Re-export core types for convenience
pub use lsrag_core::{AgentGateway, Error, Result, Session, TurnEvent, TurnStream};
