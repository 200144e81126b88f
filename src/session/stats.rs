use crate::error::{CallError, RecognitionError};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Idle,
    Active,
    Ended,
}

/// User-facing view of the last error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    /// Stable machine-readable kind, e.g. "permission_denied" or "recognition:no-speech"
    pub kind: String,

    pub message: String,
}

impl From<&CallError> for ErrorView {
    fn from(e: &CallError) -> Self {
        let kind = match e {
            CallError::PermissionDenied => "permission_denied".to_string(),
            CallError::Unsupported => "unsupported".to_string(),
            CallError::AlreadyActive => "already_active".to_string(),
            CallError::Startup(_) => "startup".to_string(),
            CallError::Recognition(RecognitionError::Other(_)) => "recognition:other".to_string(),
            CallError::Recognition(r) => format!("recognition:{}", r),
        };

        Self {
            kind,
            message: e.user_message(),
        }
    }
}

/// Point-in-time view of the call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSnapshot {
    pub call_id: Option<String>,

    pub status: CallStatus,

    pub started_at: Option<DateTime<Utc>>,

    pub mic_permission_granted: bool,

    pub listening: bool,

    pub speaking: bool,

    /// At least one turn is waiting for its reply
    pub processing: bool,

    /// Normalized microphone level in [0, 1]
    pub audio_level: f32,

    pub interim_transcript: String,

    pub last_error: Option<ErrorView>,

    pub session_progress: u8,

    /// Turns recorded during this call
    pub turns_processed: usize,
}
