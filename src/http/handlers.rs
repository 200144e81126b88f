use super::state::AppState;
use crate::error::{CallError, RecognitionError};
use crate::host::{BridgeCapabilities, QueuedUtterance, RecognizerDirective};
use crate::notify::EventKind;
use crate::orchestrator::{ConversationContext, ConversationTurn};
use crate::speech::{RecognitionBatch, RecognitionEvent, Voice};
use crate::storage::{ONBOARDING_KEY, USER_PROFILE_KEY};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallRequest {
    /// Whether the browser granted microphone access
    pub mic_permission: bool,

    /// Whether the browser offers speech recognition
    #[serde(default = "default_true")]
    pub recognition_supported: bool,

    /// Voices offered by the browser, in its order
    #[serde(default)]
    pub voices: Vec<Voice>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFrameRequest {
    pub frequency_bins: Vec<u8>,
}

/// Recognizer callback forwarded by the browser
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognitionEventRequest {
    Start,
    Result(RecognitionBatch),
    Error { error: String },
    End,
}

impl From<RecognitionEventRequest> for RecognitionEvent {
    fn from(req: RecognitionEventRequest) -> Self {
        match req {
            RecognitionEventRequest::Start => RecognitionEvent::Started,
            RecognitionEventRequest::Result(batch) => RecognitionEvent::Results(batch),
            RecognitionEventRequest::Error { error } => {
                RecognitionEvent::Error(RecognitionError::from_code(&error))
            }
            RecognitionEventRequest::End => RecognitionEvent::Ended,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OnboardingRequest {
    pub answers: Value,
    #[serde(default)]
    pub profile: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

fn error_response(status: StatusCode, error: impl Into<String>, kind: Option<&str>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            kind: kind.map(str::to_string),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /call/start
/// Start a voice call
pub async fn start_call(
    State(state): State<AppState>,
    Json(req): Json<StartCallRequest>,
) -> impl IntoResponse {
    let bridge = state.bridge.clone();
    let capabilities = BridgeCapabilities {
        mic_permission: req.mic_permission,
        recognition_supported: req.recognition_supported,
        voices: req.voices,
    };

    // A start rejected as already active leaves the running call's bridge alone
    match state.call.start_with(move || bridge.declare(capabilities)).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => {
            let status = match e {
                CallError::PermissionDenied => StatusCode::FORBIDDEN,
                CallError::Unsupported => StatusCode::NOT_IMPLEMENTED,
                CallError::AlreadyActive => StatusCode::CONFLICT,
                CallError::Recognition(_) | CallError::Startup(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            error!("Failed to start call: {}", e);
            let kind = crate::session::ErrorView::from(&e).kind;
            error_response(status, e.user_message(), Some(&kind))
        }
    }
}

/// POST /call/end
/// End the active call
pub async fn end_call(State(state): State<AppState>) -> impl IntoResponse {
    match state.call.end().await {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => error_response(StatusCode::CONFLICT, "No active call", None),
    }
}

/// GET /call/status
pub async fn call_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.call.snapshot().await))
}

/// POST /call/error/dismiss
pub async fn dismiss_error(State(state): State<AppState>) -> impl IntoResponse {
    state.call.dismiss_error();
    StatusCode::NO_CONTENT
}

/// POST /call/audio
/// Push one analyser frame from the browser microphone
pub async fn push_audio(
    State(state): State<AppState>,
    Json(req): Json<AudioFrameRequest>,
) -> impl IntoResponse {
    if state.bridge.push_audio(req.frequency_bins) {
        StatusCode::ACCEPTED.into_response()
    } else {
        error_response(StatusCode::CONFLICT, "Microphone is not capturing", None)
    }
}

/// GET /call/recognition
/// Recognizer run the browser should have going
pub async fn recognizer_directive(State(state): State<AppState>) -> Json<RecognizerDirective> {
    Json(state.bridge.recognizer_directive())
}

/// POST /call/recognition
/// Push one speech-recognition callback from the browser
pub async fn push_recognition(
    State(state): State<AppState>,
    Json(req): Json<RecognitionEventRequest>,
) -> impl IntoResponse {
    if state.bridge.push_recognition(req.into()) {
        StatusCode::ACCEPTED.into_response()
    } else {
        error_response(StatusCode::CONFLICT, "Speech recognition is not running", None)
    }
}

/// GET /call/speech
/// Take the utterances the browser should play
pub async fn drain_speech(State(state): State<AppState>) -> Json<Vec<QueuedUtterance>> {
    Json(state.bridge.drain_speech())
}

/// POST /call/speech/:utterance_id/ended
pub async fn speech_ended(
    State(state): State<AppState>,
    Path(utterance_id): Path<u64>,
) -> impl IntoResponse {
    if state.bridge.finish_utterance(utterance_id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Utterance {} not found", utterance_id),
            None,
        )
    }
}

/// GET /history
pub async fn get_history(State(state): State<AppState>) -> Json<Vec<ConversationTurn>> {
    Json(state.orchestrator.history().await)
}

/// DELETE /history
pub async fn clear_history(State(state): State<AppState>) -> impl IntoResponse {
    match state.orchestrator.clear_history().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Failed to clear history: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to clear history: {}", e),
                None,
            )
        }
    }
}

/// GET /context
pub async fn get_context(State(state): State<AppState>) -> Json<ConversationContext> {
    Json(state.orchestrator.context().await)
}

/// POST /onboarding
/// Store onboarding answers and the user profile
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Json(req): Json<OnboardingRequest>,
) -> impl IntoResponse {
    let stored = state
        .store
        .set(ONBOARDING_KEY, req.answers.to_string())
        .and_then(|_| match &req.profile {
            Some(profile) => state.store.set(USER_PROFILE_KEY, profile.to_string()),
            None => Ok(()),
        });

    if let Err(e) = stored {
        error!("Failed to store onboarding: {:#}", e);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to store onboarding: {}", e),
            None,
        );
    }

    info!("Onboarding completed");

    state
        .notifier
        .notify(EventKind::OnboardingCompleted, json!({ "answers": req.answers }));

    StatusCode::NO_CONTENT.into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
