use crate::heuristics::{Mood, Topic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Retention cap applied to history on the remote-completion path
pub const HISTORY_CAP: usize = 50;

/// Number of topics kept in the rolling context
pub const CONTEXT_TOPIC_CAP: usize = 10;

/// Per-turn progress increment
pub const PROGRESS_STEP: u8 = 10;

pub const PROGRESS_MAX: u8 = 100;

/// Which path produced the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Remote,
    Fallback,
}

/// One user utterance plus its reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    /// Millisecond timestamp plus sequence, sortable by recency
    pub id: String,

    pub timestamp: DateTime<Utc>,

    pub user_message: String,

    pub ai_response: String,

    pub mood: Mood,

    pub topics: Vec<Topic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<i8>,

    #[serde(default = "default_source")]
    pub source: ReplySource,
}

fn default_source() -> ReplySource {
    ReplySource::Remote
}

/// Rolling memory carried from turn to turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub recent_topics: Vec<Topic>,

    pub emotional_state: Mood,

    pub session_progress: u8,
}

impl ConversationContext {
    /// Merge a turn's topics: append, de-duplicate keeping first occurrence,
    /// then keep the last ten. A repeated topic keeps its original position.
    pub fn merge_topics(&mut self, topics: &[Topic]) {
        let mut merged: Vec<Topic> = Vec::with_capacity(self.recent_topics.len() + topics.len());
        for topic in self.recent_topics.iter().chain(topics.iter()) {
            if !merged.contains(topic) {
                merged.push(*topic);
            }
        }

        let excess = merged.len().saturating_sub(CONTEXT_TOPIC_CAP);
        self.recent_topics = merged.split_off(excess);
    }

    pub fn advance_progress(&mut self) {
        self.session_progress = self
            .session_progress
            .saturating_add(PROGRESS_STEP)
            .min(PROGRESS_MAX);
    }

    pub fn has_topic(&self, topic: Topic) -> bool {
        self.recent_topics.contains(&topic)
    }

    /// The last `n` topics, oldest first
    pub fn last_topics(&self, n: usize) -> &[Topic] {
        let start = self.recent_topics.len().saturating_sub(n);
        &self.recent_topics[start..]
    }
}

/// Conversation history, most recent first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    turns: Vec<ConversationTurn>,
}

impl History {
    pub fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        Self { turns }
    }

    /// Prepend a turn and evict the oldest entries beyond `HISTORY_CAP`
    pub fn push_capped(&mut self, turn: ConversationTurn) {
        self.turns.insert(0, turn);
        self.turns.truncate(HISTORY_CAP);
    }

    /// Prepend a turn without eviction (fallback path)
    pub fn push_uncapped(&mut self, turn: ConversationTurn) {
        self.turns.insert(0, turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn latest(&self) -> Option<&ConversationTurn> {
        self.turns.first()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
