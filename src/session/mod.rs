//! Call session management
//!
//! This module provides the `CallSession` state machine that manages:
//! - Microphone permission preflight and capture with a level meter
//! - Continuous dictation with auto-restart
//! - Dispatch of finalized transcripts to the turn orchestrator
//! - Speech output of replies
//! - Aggregated call state and error reporting

mod config;
mod session;
mod stats;

pub use config::CallConfig;
pub use session::CallSession;
pub use stats::{CallSnapshot, CallStatus, ErrorView};
