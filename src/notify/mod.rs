//! Best-effort event notifications
//!
//! Lifecycle events (onboarding, call start/end, turns, history clears) are
//! posted to an optional webhook. Events are built on the caller's task and
//! delivered in order by a background task, so a slow or dead webhook never
//! holds up a call. Delivery failures are logged and dropped.

pub mod events;
pub mod webhook;

pub use events::{EventKind, JournalEvent};
pub use webhook::WebhookSink;

use crate::storage::{KeyValueStore, USER_PROFILE_KEY};
use anyhow::Result;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: &JournalEvent) -> Result<()>;
}

/// Builds event payloads and queues them for the sink
pub struct Notifier {
    sink: Option<Arc<dyn EventSink>>,
    store: Arc<dyn KeyValueStore>,

    /// Started on the first event, inside the caller's runtime
    outbox: OnceLock<mpsc::UnboundedSender<JournalEvent>>,
}

impl Notifier {
    pub fn new(sink: Option<Arc<dyn EventSink>>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            sink,
            store,
            outbox: OnceLock::new(),
        }
    }

    fn user_profile(&self) -> Option<Value> {
        match self.store.get(USER_PROFILE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read user profile for event: {}", e);
                None
            }
        }
    }

    /// Queue an event for delivery; returns without waiting on the sink
    pub fn notify(&self, kind: EventKind, data: Value) {
        let Some(sink) = &self.sink else {
            return;
        };

        let event = JournalEvent::new(kind, self.user_profile(), data);
        let outbox = self.outbox.get_or_init(|| spawn_delivery(Arc::clone(sink)));

        if outbox.send(event).is_err() {
            warn!("Event delivery task has stopped, dropping {:?} event", kind);
        }
    }
}

fn spawn_delivery(sink: Arc<dyn EventSink>) -> mpsc::UnboundedSender<JournalEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel::<JournalEvent>();

    tokio::spawn(async move {
        debug!("Event delivery task started");
        while let Some(event) = rx.recv().await {
            if let Err(e) = sink.deliver(&event).await {
                warn!("Failed to deliver {:?} event: {:#}", event.event, e);
            }
        }
        debug!("Event delivery task stopped");
    });

    tx
}
