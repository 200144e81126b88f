//! Conversation turn pipeline
//!
//! This module turns a finalized transcript into a recorded turn:
//! - Mood and topic tagging
//! - Context-aware system prompt
//! - Remote completion with a local fallback reply
//! - History retention and rolling context updates

pub mod fallback;
mod guard;
mod orchestrator;
pub mod prompt;
mod turn;

pub use fallback::fallback_reply;
pub use guard::{SessionGeneration, SessionGuard};
pub use orchestrator::{SessionSummary, TurnOrchestrator, MIN_MESSAGE_CHARS};
pub use prompt::{build_system_prompt, SYSTEM_PROMPT};
pub use turn::{
    ConversationContext, ConversationTurn, History, ReplySource, CONTEXT_TOPIC_CAP, HISTORY_CAP,
    PROGRESS_MAX, PROGRESS_STEP,
};
