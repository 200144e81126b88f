use super::synthesizer::{select_voice, SpeechSynthesizer, Utterance};
use crate::config::SpeechConfig;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Speaks replies one at a time; a new reply replaces the one playing
pub struct SpeechOutput {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    settings: SpeechConfig,
    speaking: Arc<AtomicBool>,
    utterance_seq: Arc<AtomicU64>,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl SpeechOutput {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, settings: SpeechConfig) -> Self {
        Self {
            synthesizer,
            settings,
            speaking: Arc::new(AtomicBool::new(false)),
            utterance_seq: Arc::new(AtomicU64::new(0)),
            current: Mutex::new(None),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Speak `text`, cancelling whatever is in flight
    pub async fn speak(&self, text: &str) {
        let mut current = self.current.lock().await;

        if let Some(previous) = current.take() {
            previous.abort();
            self.synthesizer.cancel();
            debug!("Replaced in-flight utterance");
        }

        let voice = select_voice(&self.synthesizer.voices(), &self.settings.preferred_voices);
        let utterance = Utterance {
            text: text.to_string(),
            voice: voice.map(|v| v.name),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            volume: self.settings.volume,
        };

        let id = self.utterance_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.speaking.store(true, Ordering::SeqCst);
        info!(
            "Speaking reply ({} chars, voice={})",
            utterance.text.len(),
            utterance.voice.as_deref().unwrap_or("default")
        );

        let synthesizer = Arc::clone(&self.synthesizer);
        let speaking = Arc::clone(&self.speaking);
        let utterance_seq = Arc::clone(&self.utterance_seq);

        *current = Some(tokio::spawn(async move {
            if let Err(e) = synthesizer.speak(utterance).await {
                warn!("Speech synthesis failed: {:#}", e);
            }
            // A newer utterance owns the flag now
            if utterance_seq.load(Ordering::SeqCst) == id {
                speaking.store(false, Ordering::SeqCst);
            }
        }));
    }

    /// Cancel everything pending or playing; safe when idle
    pub async fn stop(&self) {
        let mut current = self.current.lock().await;
        if let Some(task) = current.take() {
            task.abort();
        }
        self.synthesizer.cancel();

        if self.speaking.swap(false, Ordering::SeqCst) {
            info!("Speech output stopped");
        }
    }
}
