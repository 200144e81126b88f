use super::fallback::fallback_reply;
use super::guard::SessionGuard;
use super::prompt::build_system_prompt;
use super::turn::{ConversationContext, ConversationTurn, History, ReplySource, PROGRESS_MAX};
use crate::completion::CompletionClient;
use crate::heuristics::{detect_mood, extract_topics};
use crate::notify::{EventKind, Notifier};
use crate::storage::{KeyValueStore, CONTEXT_KEY, HISTORY_KEY};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Minimum trimmed transcript length that produces a turn
pub const MIN_MESSAGE_CHARS: usize = 2;

#[derive(Debug, Default)]
struct JournalState {
    history: History,
    context: ConversationContext,

    /// Turns appended since the last `begin_session`
    session_turns: usize,
}

impl JournalState {
    fn summary(&self) -> SessionSummary {
        SessionSummary {
            progress: self.context.session_progress,
            turns: self.session_turns,
        }
    }
}

/// Per-call figures reported when a call ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub progress: u8,
    pub turns: usize,
}

/// Turns finalized transcripts into conversation turns.
///
/// Owns the history and the rolling context. Every appended turn is written
/// back to the key-value store and announced to the notifier.
pub struct TurnOrchestrator {
    completion: Arc<dyn CompletionClient>,
    notifier: Arc<Notifier>,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<JournalState>,
    turn_sequence: AtomicU64,
}

impl TurnOrchestrator {
    /// Create an orchestrator, restoring history and context from the store
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        notifier: Arc<Notifier>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let history = History::from_turns(load_json(store.as_ref(), HISTORY_KEY).unwrap_or_default());
        let context: ConversationContext = load_json(store.as_ref(), CONTEXT_KEY).unwrap_or_default();

        info!(
            "Journal restored: {} turns, {} context topics",
            history.len(),
            context.recent_topics.len()
        );

        Self {
            completion,
            notifier,
            store,
            state: Mutex::new(JournalState {
                history,
                context,
                session_turns: 0,
            }),
            turn_sequence: AtomicU64::new(0),
        }
    }

    /// Process a transcript outside of any call session
    pub async fn process_turn(&self, raw_text: &str) -> Option<ConversationTurn> {
        self.process_turn_guarded(raw_text, &SessionGuard::detached())
            .await
    }

    /// Process a finalized transcript for the call identified by `guard`.
    ///
    /// Returns the appended turn, or `None` when the text is too short or the
    /// call ended while the reply was being generated.
    pub async fn process_turn_guarded(
        &self,
        raw_text: &str,
        guard: &SessionGuard,
    ) -> Option<ConversationTurn> {
        let text = raw_text.trim();
        if text.chars().count() < MIN_MESSAGE_CHARS {
            debug!("Ignoring transcript shorter than {} chars", MIN_MESSAGE_CHARS);
            return None;
        }

        let mood = detect_mood(text);
        let topics = extract_topics(text);

        let system_prompt = {
            let state = self.state.lock().await;
            build_system_prompt(&state.context)
        };

        let remote = self.completion.complete(&system_prompt, text).await;

        let turn = {
            let mut state = self.state.lock().await;

            // Checked under the state lock; finish_session takes the same lock
            if !guard.is_current() {
                drop(state);
                warn!(
                    "Dropping reply for a call that already ended (generation {})",
                    guard.issued()
                );
                self.notifier.notify(
                    EventKind::TurnDiscarded,
                    json!({ "userMessage": text, "generation": guard.issued() }),
                );
                return None;
            }

            let (reply, source) = match remote {
                Ok(reply) => (reply, ReplySource::Remote),
                Err(e) => {
                    warn!("Remote completion failed, using fallback reply: {}", e);
                    (fallback_reply(text, &state.context), ReplySource::Fallback)
                }
            };

            let timestamp = Utc::now();
            let seq = self.turn_sequence.fetch_add(1, Ordering::SeqCst);
            let turn = ConversationTurn {
                id: format!("{}-{:04}", timestamp.timestamp_millis(), seq % 10_000),
                timestamp,
                user_message: text.to_string(),
                ai_response: reply,
                mood,
                topics: topics.clone(),
                sentiment: Some(mood.sentiment()),
                source,
            };

            match source {
                ReplySource::Remote => state.history.push_capped(turn.clone()),
                // Fallback turns skip eviction; see DESIGN.md
                ReplySource::Fallback => state.history.push_uncapped(turn.clone()),
            }

            state.context.merge_topics(&topics);
            state.context.emotional_state = mood;
            state.context.advance_progress();
            state.session_turns += 1;

            self.persist(&state).await;
            turn
        };

        info!(
            "Turn {} recorded (mood={}, topics={}, source={:?})",
            turn.id,
            turn.mood,
            turn.topics.len(),
            turn.source
        );

        self.notifier.notify(EventKind::ConversationTurn, json!({ "turn": &turn }));

        Some(turn)
    }

    /// Reset per-call progress and the turn count at call start
    pub async fn begin_session(&self) {
        let mut state = self.state.lock().await;
        state.context.session_progress = 0;
        state.session_turns = 0;
        self.persist(&state).await;
    }

    /// Mark the call complete
    pub async fn finish_session(&self) -> SessionSummary {
        let mut state = self.state.lock().await;
        state.context.session_progress = PROGRESS_MAX;
        self.persist(&state).await;
        state.summary()
    }

    /// Progress and turn count of the current or last call
    pub async fn session_summary(&self) -> SessionSummary {
        self.state.lock().await.summary()
    }

    /// Clear history and context, locally and in the store
    pub async fn clear_history(&self) -> Result<()> {
        let cleared = {
            let mut state = self.state.lock().await;
            let cleared = state.history.len();
            state.history.clear();
            state.context = ConversationContext::default();

            self.with_store(|store| {
                store.remove(HISTORY_KEY)?;
                store.remove(CONTEXT_KEY)
            })
            .await?;
            cleared
        };

        info!("Cleared {} turns from history", cleared);

        self.notifier.notify(EventKind::HistoryCleared, json!({ "clearedTurns": cleared }));

        Ok(())
    }

    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.state.lock().await.history.turns().to_vec()
    }

    pub async fn context(&self) -> ConversationContext {
        self.state.lock().await.context.clone()
    }

    /// Write history and context back; the caller holds the state lock so
    /// writes land in order
    async fn persist(&self, state: &JournalState) {
        let history = serde_json::to_string(&state.history);
        let context = serde_json::to_string(&state.context);

        let written = self
            .with_store(move |store| {
                if let Err(e) = store_serialized(store, HISTORY_KEY, history) {
                    warn!("Failed to persist history: {:#}", e);
                }
                if let Err(e) = store_serialized(store, CONTEXT_KEY, context) {
                    warn!("Failed to persist context: {:#}", e);
                }
                Ok(())
            })
            .await;

        if let Err(e) = written {
            warn!("Failed to persist journal: {:#}", e);
        }
    }

    /// Run blocking store I/O off the async workers
    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&dyn KeyValueStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .context("Store task failed")?
    }
}

fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read {}: {:#}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring malformed {}: {}", key, e);
            None
        }
    }
}

fn store_serialized(
    store: &dyn KeyValueStore,
    key: &str,
    value: serde_json::Result<String>,
) -> Result<()> {
    store.set(key, value?)
}
