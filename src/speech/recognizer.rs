use crate::error::RecognitionError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One recognition hypothesis within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

/// Results delivered by one recognizer callback
///
/// `results` is the recognizer's cumulative list; entries before
/// `result_index` were already delivered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionBatch {
    #[serde(default)]
    pub result_index: usize,
    pub results: Vec<RecognitionResult>,
}

/// Interim view and finalized text extracted from a batch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchTranscript {
    pub interim: String,
    pub finalized: Option<String>,
}

impl RecognitionBatch {
    pub fn transcript(&self) -> BatchTranscript {
        let mut interim = String::new();
        let mut finalized = String::new();

        for result in self.results.iter().skip(self.result_index) {
            if result.is_final {
                finalized.push_str(&result.transcript);
            } else {
                interim.push_str(&result.transcript);
            }
        }

        let finalized = finalized.trim();
        BatchTranscript {
            interim,
            finalized: (!finalized.is_empty()).then(|| finalized.to_string()),
        }
    }
}

/// Callbacks from a running recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Started,
    Results(RecognitionBatch),
    Error(RecognitionError),
    Ended,
}

/// Host continuous-dictation capability
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Whether the host can recognize speech at all
    fn is_supported(&self) -> bool;

    /// Begin a recognition run; events arrive until `Ended` or the channel closes
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>>;

    /// End the current run; safe to call when idle
    async fn stop(&mut self) -> Result<()>;

    /// Get recognizer name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str, is_final: bool) -> RecognitionResult {
        RecognitionResult {
            transcript: text.to_string(),
            is_final,
        }
    }

    #[test]
    fn skips_results_before_index() {
        let batch = RecognitionBatch {
            result_index: 1,
            results: vec![result("old words", true), result(" new words ", true)],
        };
        assert_eq!(batch.transcript().finalized.as_deref(), Some("new words"));
    }

    #[test]
    fn interim_only_batch_has_no_final() {
        let batch = RecognitionBatch {
            result_index: 0,
            results: vec![result("I feel", false), result(" fine", false)],
        };
        let out = batch.transcript();
        assert_eq!(out.interim, "I feel fine");
        assert!(out.finalized.is_none());
    }

    #[test]
    fn whitespace_final_is_ignored() {
        let batch = RecognitionBatch {
            result_index: 0,
            results: vec![result("   ", true)],
        };
        assert!(batch.transcript().finalized.is_none());
    }
}
