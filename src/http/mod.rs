//! HTTP API for the browser client
//!
//! This module provides a REST API for driving the journal:
//! - POST /call/start, /call/end - Call lifecycle
//! - GET /call/status - Call snapshot
//! - POST /call/audio, /call/recognition - Microphone and recognizer bridge
//! - GET /call/recognition - Recognizer run the browser should have going
//! - GET /call/speech, POST /call/speech/:id/ended - Speech output bridge
//! - GET/DELETE /history, GET /context - Journal data
//! - POST /onboarding - Onboarding answers and profile
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{RecognitionEventRequest, StartCallRequest};
pub use routes::create_router;
pub use state::AppState;
