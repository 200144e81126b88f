use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A voice offered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    #[serde(default)]
    pub lang: String,
}

impl Voice {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: String::new(),
        }
    }
}

/// One request to the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    pub text: String,
    /// Chosen voice name; `None` means the host default
    pub voice: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Host text-to-speech capability
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn voices(&self) -> Vec<Voice>;

    /// Speak the utterance; resolves when playback ends or fails
    async fn speak(&self, utterance: Utterance) -> Result<()>;

    /// Drop every pending and playing utterance
    fn cancel(&self);
}

/// First voice whose name contains any preferred substring
pub fn select_voice(voices: &[Voice], preferences: &[String]) -> Option<Voice> {
    voices
        .iter()
        .find(|v| preferences.iter().any(|p| v.name.contains(p.as_str())))
        .cloned()
}
