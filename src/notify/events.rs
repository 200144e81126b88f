use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle events delivered to the webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    OnboardingCompleted,
    CallStarted,
    CallEnded,
    ConversationTurn,
    TurnDiscarded,
    HistoryCleared,
}

/// Webhook payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEvent {
    pub event: EventKind,

    /// RFC3339 timestamp
    pub timestamp: String,

    /// Snapshot of the stored user profile, if any
    pub user_profile: Option<Value>,

    pub data: Value,
}

impl JournalEvent {
    pub fn new(event: EventKind, user_profile: Option<Value>, data: Value) -> Self {
        Self {
            event,
            timestamp: Utc::now().to_rfc3339(),
            user_profile,
            data,
        }
    }
}
