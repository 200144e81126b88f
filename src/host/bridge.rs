//! Host capabilities fed by a remote browser client.
//!
//! The client runs the actual microphone analyser, recognizer and voice. It
//! pushes analyser frames and recognition callbacks through the HTTP API and
//! polls for utterances to play, reporting back when each one finishes.
//!
//! Recognizer runs are driven by the service: every start (including the
//! automatic restart after a run ends) bumps the run number in the
//! `RecognizerDirective`, and the client starts its recognizer again when it
//! sees a run it has not started yet.

use super::HostPlatform;
use crate::audio::{AudioBackend, AudioBackendConfig, AudioFrame};
use crate::error::CaptureError;
use crate::speech::{RecognitionEvent, SpeechRecognizer, SpeechSynthesizer, Utterance, Voice};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Upper bound on waiting for the client to report playback end
pub const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(120);

const RECOGNITION_BUFFER: usize = 100;

/// What the client says it can do, declared when a call starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeCapabilities {
    pub mic_permission: bool,
    pub recognition_supported: bool,
    #[serde(default)]
    pub voices: Vec<Voice>,
}

/// What the client's recognizer should be doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizerDirective {
    /// Bumped for every recognizer run the service asks for
    pub run: u64,

    pub listen: bool,
}

/// An utterance waiting to be played by the client
#[derive(Debug, Clone, Serialize)]
pub struct QueuedUtterance {
    pub id: u64,
    #[serde(flatten)]
    pub utterance: Utterance,
}

#[derive(Default)]
struct SpeechQueue {
    pending: VecDeque<QueuedUtterance>,
    playing: HashMap<u64, oneshot::Sender<()>>,
}

#[derive(Default)]
struct BridgeShared {
    capabilities: Mutex<BridgeCapabilities>,
    audio: Mutex<Option<(mpsc::Sender<AudioFrame>, Instant)>>,
    recognition: Mutex<Option<mpsc::Sender<RecognitionEvent>>>,
    directive: Mutex<RecognizerDirective>,
    speech: Mutex<SpeechQueue>,
    utterance_seq: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared handle used by both the HTTP layer and the call session
#[derive(Clone, Default)]
pub struct BridgeHost {
    shared: Arc<BridgeShared>,
}

impl BridgeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&self, capabilities: BridgeCapabilities) {
        info!(
            "Bridge client declared capabilities (mic={}, recognition={}, voices={})",
            capabilities.mic_permission,
            capabilities.recognition_supported,
            capabilities.voices.len()
        );
        *lock(&self.shared.capabilities) = capabilities;
    }

    /// Forward one analyser frame; false when no capture is running
    pub fn push_audio(&self, frequency_bins: Vec<u8>) -> bool {
        let Some((tx, started)) = lock(&self.shared.audio).clone() else {
            return false;
        };

        let frame = AudioFrame {
            frequency_bins,
            timestamp_ms: started.elapsed().as_millis() as u64,
        };

        // A full buffer only costs a meter update
        if let Err(mpsc::error::TrySendError::Closed(_)) = tx.try_send(frame) {
            return false;
        }
        true
    }

    /// Forward one recognizer callback; false when no recognizer is running
    pub fn push_recognition(&self, event: RecognitionEvent) -> bool {
        let Some(tx) = lock(&self.shared.recognition).clone() else {
            return false;
        };

        match tx.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropped recognition event: {}", e);
                false
            }
        }
    }

    /// Current recognizer run the client should have going
    pub fn recognizer_directive(&self) -> RecognizerDirective {
        *lock(&self.shared.directive)
    }

    /// Take every utterance queued for playback
    pub fn drain_speech(&self) -> Vec<QueuedUtterance> {
        lock(&self.shared.speech).pending.drain(..).collect()
    }

    /// Client reports that an utterance finished; false if it is unknown
    pub fn finish_utterance(&self, id: u64) -> bool {
        let mut queue = lock(&self.shared.speech);
        queue.pending.retain(|u| u.id != id);
        match queue.playing.remove(&id) {
            Some(done) => {
                let _ = done.send(());
                true
            }
            None => false,
        }
    }
}

impl HostPlatform for BridgeHost {
    fn audio_backend(&self, config: AudioBackendConfig) -> Box<dyn AudioBackend> {
        Box::new(BridgeAudio {
            shared: Arc::clone(&self.shared),
            config,
            capturing: false,
        })
    }

    fn speech_recognizer(&self) -> Box<dyn SpeechRecognizer> {
        Box::new(BridgeRecognizer {
            shared: Arc::clone(&self.shared),
        })
    }

    fn speech_synthesizer(&self) -> Arc<dyn SpeechSynthesizer> {
        Arc::new(BridgeSynthesizer {
            shared: Arc::clone(&self.shared),
        })
    }
}

struct BridgeAudio {
    shared: Arc<BridgeShared>,
    config: AudioBackendConfig,
    capturing: bool,
}

#[async_trait::async_trait]
impl AudioBackend for BridgeAudio {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if !lock(&self.shared.capabilities).mic_permission {
            return Err(CaptureError::PermissionDenied);
        }

        let (tx, rx) = mpsc::channel(self.config.frame_buffer.max(1));
        *lock(&self.shared.audio) = Some((tx, Instant::now()));
        self.capturing = true;

        debug!("Bridge audio capture opened");
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        lock(&self.shared.audio).take();
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "bridge microphone"
    }
}

struct BridgeRecognizer {
    shared: Arc<BridgeShared>,
}

#[async_trait::async_trait]
impl SpeechRecognizer for BridgeRecognizer {
    fn is_supported(&self) -> bool {
        lock(&self.shared.capabilities).recognition_supported
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        if !self.is_supported() {
            bail!("Client has no speech recognizer");
        }

        // Listening starts when the client reports its recognizer started
        let (tx, rx) = mpsc::channel(RECOGNITION_BUFFER);
        *lock(&self.shared.recognition) = Some(tx);

        let run = {
            let mut directive = lock(&self.shared.directive);
            directive.run += 1;
            directive.listen = true;
            directive.run
        };

        debug!("Bridge recognizer run {} requested", run);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        lock(&self.shared.directive).listen = false;
        if let Some(tx) = lock(&self.shared.recognition).take() {
            let _ = tx.try_send(RecognitionEvent::Ended);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "bridge recognizer"
    }
}

struct BridgeSynthesizer {
    shared: Arc<BridgeShared>,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for BridgeSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        lock(&self.shared.capabilities).voices.clone()
    }

    async fn speak(&self, utterance: Utterance) -> Result<()> {
        let id = self.shared.utterance_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let (done_tx, done_rx) = oneshot::channel();

        {
            let mut queue = lock(&self.shared.speech);
            queue.pending.push_back(QueuedUtterance { id, utterance });
            queue.playing.insert(id, done_tx);
        }

        match tokio::time::timeout(PLAYBACK_TIMEOUT, done_rx).await {
            Ok(Ok(())) => Ok(()),
            // Sender dropped by cancel()
            Ok(Err(_)) => Ok(()),
            Err(_) => {
                lock(&self.shared.speech).playing.remove(&id);
                bail!("Client never reported end of utterance {}", id)
            }
        }
    }

    fn cancel(&self) {
        let mut queue = lock(&self.shared.speech);
        queue.pending.clear();
        queue.playing.clear();
    }
}
