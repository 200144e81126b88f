use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recognition failures reported by the speech recognizer host
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "code", content = "detail")]
pub enum RecognitionError {
    #[error("no-speech")]
    NoSpeech,
    #[error("audio-capture")]
    AudioCapture,
    #[error("not-allowed")]
    NotAllowed,
    #[error("network")]
    Network,
    #[error("{0}")]
    Other(String),
}

impl RecognitionError {
    /// Map a raw recognizer error code onto the taxonomy
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "not-allowed" | "service-not-allowed" => Self::NotAllowed,
            "network" => Self::Network,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::NoSpeech => "No speech detected. Please try speaking again.".to_string(),
            Self::AudioCapture => {
                "Microphone not accessible. Please check your microphone connection.".to_string()
            }
            Self::NotAllowed => {
                "Microphone permission denied. Please allow microphone access and try again."
                    .to_string()
            }
            Self::Network => "Network error. Please check your internet connection.".to_string(),
            Self::Other(code) => format!("Speech recognition error: {}", code),
        }
    }
}

/// Errors that reach user-visible call state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("speech recognition is not supported by this host")]
    Unsupported,

    #[error("speech recognition failed: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("a call is already active")]
    AlreadyActive,

    #[error("failed to start call: {0}")]
    Startup(String),
}

impl CallError {
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Microphone access was denied. Please allow microphone access to start a call."
                    .to_string()
            }
            Self::Unsupported => {
                "Speech recognition is not supported here. Please use a supported browser."
                    .to_string()
            }
            Self::Recognition(e) => e.user_message(),
            Self::AlreadyActive => "A call is already in progress.".to_string(),
            Self::Startup(reason) => format!("Could not start the call: {}", reason),
        }
    }
}

/// Microphone acquisition failures
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("audio device error: {0}")]
    Device(String),
}

impl From<CaptureError> for CallError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::PermissionDenied => CallError::PermissionDenied,
            CaptureError::Device(reason) => CallError::Startup(reason),
        }
    }
}

/// Remote completion failures; always recovered by the local fallback
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API key is not configured")]
    MissingApiKey,

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion response malformed: {0}")]
    Malformed(String),

    #[error("completion timed out after {0}s")]
    Timeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_browser_codes() {
        assert_eq!(RecognitionError::from_code("no-speech"), RecognitionError::NoSpeech);
        assert_eq!(RecognitionError::from_code("not-allowed"), RecognitionError::NotAllowed);
        assert_eq!(
            RecognitionError::from_code("aborted"),
            RecognitionError::Other("aborted".to_string())
        );
    }

    #[test]
    fn capture_denial_becomes_permission_denied() {
        let err: CallError = CaptureError::PermissionDenied.into();
        assert_eq!(err, CallError::PermissionDenied);
    }
}
