use super::messages::{ChatMessage, ChatRequest, ChatResponse};
use super::CompletionClient;
use crate::config::CompletionConfig;
use crate::error::CompletionError;
use std::time::Duration;
use tracing::{debug, info};

/// Chat-completion client speaking the OpenAI-style JSON protocol
pub struct ChatCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl ChatCompletionClient {
    pub fn new(config: &CompletionConfig, api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        info!(
            "Completion client configured: {} (model={}, key={})",
            config.endpoint,
            config.model,
            if api_key.is_some() { "set" } else { "missing" }
        );

        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Build from config, reading the API key from the configured environment variable
    pub fn from_config(config: &CompletionConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::new(config, api_key)
    }

    async fn send(&self, body: &ChatRequest, api_key: &str) -> Result<String, CompletionError> {
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = res.bytes().await?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        parsed
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| CompletionError::Malformed("missing choices[0].message".to_string()))
    }
}

#[async_trait::async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingApiKey)?;

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens: self.max_tokens,
        };

        debug!("Requesting completion from {}", self.endpoint);

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.send(&body, api_key))
                .await
                .map_err(|_| CompletionError::Timeout(limit.as_secs()))?,
            None => self.send(&body, api_key).await,
        }
    }
}
