//! Remote reply generation
//!
//! The orchestrator only sees the `CompletionClient` trait. Any error it
//! returns sends the turn down the local fallback path.

pub mod client;
pub mod messages;

pub use client::ChatCompletionClient;
pub use messages::{ChatMessage, ChatRequest, ChatResponse, ChatRole};

use crate::error::CompletionError;

#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Produce a non-empty assistant reply for one system + user exchange
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}
