//! Host capabilities
//!
//! A call builds fresh capture, recognition and synthesis resources from the
//! `HostPlatform` on every start and drops them on end.

pub mod bridge;

pub use bridge::{BridgeCapabilities, BridgeHost, QueuedUtterance, RecognizerDirective};

use crate::audio::{AudioBackend, AudioBackendConfig};
use crate::speech::{SpeechRecognizer, SpeechSynthesizer};
use std::sync::Arc;

pub trait HostPlatform: Send + Sync {
    fn audio_backend(&self, config: AudioBackendConfig) -> Box<dyn AudioBackend>;

    fn speech_recognizer(&self) -> Box<dyn SpeechRecognizer>;

    fn speech_synthesizer(&self) -> Arc<dyn SpeechSynthesizer>;
}
