use super::events::JournalEvent;
use super::EventSink;
use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::debug;

pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build webhook client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl EventSink for WebhookSink {
    async fn deliver(&self, event: &JournalEvent) -> Result<()> {
        let res = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .context("Failed to send webhook")?;

        if !res.status().is_success() {
            bail!("Webhook returned {}", res.status());
        }

        debug!("Delivered {:?} event to {}", event.event, self.url);
        Ok(())
    }
}
