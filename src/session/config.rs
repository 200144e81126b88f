use crate::audio::AudioBackendConfig;
use crate::config::SpeechConfig;

/// Configuration for a call session
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Voice settings and recognizer restart delay
    pub speech: SpeechConfig,

    /// Microphone frame buffering
    pub audio: AudioBackendConfig,

    /// Capacity of the transcript event channel
    pub event_buffer: usize,
}

impl CallConfig {
    pub fn new(speech: SpeechConfig) -> Self {
        Self {
            speech,
            ..Default::default()
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            speech: SpeechConfig::default(),
            audio: AudioBackendConfig::default(),
            event_buffer: 100,
        }
    }
}
