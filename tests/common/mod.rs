// Shared fakes for integration tests
//
// FakeHost scripts microphone permission, recognizer support and voices, and
// lets a test drive recognizer callbacks by hand.

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use voice_journal::audio::{AudioBackend, AudioBackendConfig, AudioFrame};
use voice_journal::completion::CompletionClient;
use voice_journal::error::{CaptureError, CompletionError};
use voice_journal::host::HostPlatform;
use voice_journal::notify::{EventKind, EventSink, JournalEvent, Notifier};
use voice_journal::orchestrator::TurnOrchestrator;
use voice_journal::speech::{
    RecognitionBatch, RecognitionEvent, RecognitionResult, SpeechRecognizer, SpeechSynthesizer,
    Utterance, Voice,
};
use voice_journal::storage::{KeyValueStore, MemoryStore};

/// Poll `check` until it holds or `timeout` elapses
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

pub fn final_batch(text: &str) -> RecognitionEvent {
    RecognitionEvent::Results(RecognitionBatch {
        result_index: 0,
        results: vec![RecognitionResult {
            transcript: text.to_string(),
            is_final: true,
        }],
    })
}

pub fn interim_batch(text: &str) -> RecognitionEvent {
    RecognitionEvent::Results(RecognitionBatch {
        result_index: 0,
        results: vec![RecognitionResult {
            transcript: text.to_string(),
            is_final: false,
        }],
    })
}

// ============================================================================
// Host
// ============================================================================

#[derive(Default)]
pub struct RecognizerControl {
    pub sender: Mutex<Option<mpsc::Sender<RecognitionEvent>>>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub supported: AtomicBool,
    /// Fail every start after the first
    pub fail_restart: AtomicBool,
}

impl RecognizerControl {
    pub fn new() -> Arc<Self> {
        let control = Self::default();
        control.supported.store(true, Ordering::SeqCst);
        Arc::new(control)
    }

    /// Deliver one recognizer callback; false when no run is open
    pub async fn emit(&self, event: RecognitionEvent) -> bool {
        let sender = self.sender.lock().unwrap().clone();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// End the current run the way a host does on silence
    pub async fn end_run(&self) {
        let sender = self.sender.lock().unwrap().take();
        if let Some(tx) = sender {
            let _ = tx.send(RecognitionEvent::Ended).await;
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().unwrap().is_some()
    }
}

pub struct FakeRecognizer {
    control: Arc<RecognizerControl>,
}

impl FakeRecognizer {
    pub fn new(control: Arc<RecognizerControl>) -> Self {
        Self { control }
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for FakeRecognizer {
    fn is_supported(&self) -> bool {
        self.control.supported.load(Ordering::SeqCst)
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        let previous = self.control.starts.fetch_add(1, Ordering::SeqCst);
        if previous > 0 && self.control.fail_restart.load(Ordering::SeqCst) {
            bail!("recognizer unavailable");
        }

        let (tx, rx) = mpsc::channel(32);
        tx.send(RecognitionEvent::Started).await?;
        *self.control.sender.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.control.stops.fetch_add(1, Ordering::SeqCst);
        let sender = self.control.sender.lock().unwrap().take();
        if let Some(tx) = sender {
            let _ = tx.send(RecognitionEvent::Ended).await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fake recognizer"
    }
}

#[derive(Default)]
pub struct MicControl {
    pub granted: AtomicBool,
    pub sender: Mutex<Option<mpsc::Sender<AudioFrame>>>,
    pub opens: AtomicUsize,
}

impl MicControl {
    pub fn new(granted: bool) -> Arc<Self> {
        let control = Self::default();
        control.granted.store(granted, Ordering::SeqCst);
        Arc::new(control)
    }

    pub async fn push(&self, frequency_bins: Vec<u8>) -> bool {
        let sender = self.mic_sender();
        match sender {
            Some(tx) => tx
                .send(AudioFrame {
                    frequency_bins,
                    timestamp_ms: 0,
                })
                .await
                .is_ok(),
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.sender.lock().unwrap().is_some()
    }

    fn mic_sender(&self) -> Option<mpsc::Sender<AudioFrame>> {
        self.sender.lock().unwrap().clone()
    }
}

pub struct FakeMicrophone {
    control: Arc<MicControl>,
    capturing: bool,
}

impl FakeMicrophone {
    pub fn new(control: Arc<MicControl>) -> Self {
        Self {
            control,
            capturing: false,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for FakeMicrophone {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if !self.control.granted.load(Ordering::SeqCst) {
            return Err(CaptureError::PermissionDenied);
        }
        self.control.opens.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        *self.control.sender.lock().unwrap() = Some(tx);
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.control.sender.lock().unwrap().take();
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "fake microphone"
    }
}

/// Records utterances; optionally holds each one "playing" until cancelled
pub struct RecordingSynthesizer {
    pub voices: Vec<Voice>,
    pub spoken: Mutex<Vec<Utterance>>,
    pub finished: AtomicUsize,
    pub cancels: AtomicUsize,
    pub hold: AtomicBool,
}

impl RecordingSynthesizer {
    pub fn new(voices: Vec<Voice>) -> Arc<Self> {
        Arc::new(Self {
            voices,
            spoken: Mutex::new(Vec::new()),
            finished: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            hold: AtomicBool::new(false),
        })
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for RecordingSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    async fn speak(&self, utterance: Utterance) -> Result<()> {
        self.spoken.lock().unwrap().push(utterance);
        if self.hold.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeHost {
    pub mic: Arc<MicControl>,
    pub recognizer: Arc<RecognizerControl>,
    pub synthesizer: Arc<RecordingSynthesizer>,
}

impl FakeHost {
    pub fn new(mic_granted: bool) -> Arc<Self> {
        Arc::new(Self {
            mic: MicControl::new(mic_granted),
            recognizer: RecognizerControl::new(),
            synthesizer: RecordingSynthesizer::new(vec![
                Voice::named("Alex"),
                Voice::named("Samantha"),
            ]),
        })
    }
}

impl HostPlatform for FakeHost {
    fn audio_backend(&self, _config: AudioBackendConfig) -> Box<dyn AudioBackend> {
        Box::new(FakeMicrophone::new(Arc::clone(&self.mic)))
    }

    fn speech_recognizer(&self) -> Box<dyn SpeechRecognizer> {
        Box::new(FakeRecognizer::new(Arc::clone(&self.recognizer)))
    }

    fn speech_synthesizer(&self) -> Arc<dyn SpeechSynthesizer> {
        self.synthesizer.clone()
    }
}

// ============================================================================
// Completion
// ============================================================================

/// Always fails, as an unreachable or unconfigured remote would
pub struct FailingCompletion;

#[async_trait::async_trait]
impl CompletionClient for FailingCompletion {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        Err(CompletionError::MissingApiKey)
    }
}

/// Replies with a fixed text and records each system prompt
#[derive(Default)]
pub struct CannedCompletion {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedCompletion {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionClient for CannedCompletion {
    async fn complete(&self, system: &str, _user: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(system.to_string());
        Ok(self.reply.clone())
    }
}

/// Holds every request until `release` is called
#[derive(Default)]
pub struct GatedCompletion {
    pub gate: Notify,
    pub waiting: AtomicUsize,
}

impl GatedCompletion {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn release(&self) {
        self.gate.notify_waiters();
    }

    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CompletionClient for GatedCompletion {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, CompletionError> {
        let notified = self.gate.notified();
        self.waiting.fetch_add(1, Ordering::SeqCst);
        notified.await;
        Ok(format!("Late reply to {}", user))
    }
}

// ============================================================================
// Events
// ============================================================================

/// Records delivered events; a slow sink records late and then fails, the
/// way a webhook that hits its timeout would
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<JournalEvent>>,
    pub delay: Duration,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            delay,
        })
    }

    pub fn events(&self) -> Vec<JournalEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.event).collect()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingSink {
    async fn deliver(&self, event: &JournalEvent) -> Result<()> {
        if self.delay.is_zero() {
            self.events.lock().unwrap().push(event.clone());
            return Ok(());
        }

        tokio::time::sleep(self.delay).await;
        self.events.lock().unwrap().push(event.clone());
        bail!("webhook timed out")
    }
}

/// Orchestrator over a memory store with a recording sink
pub struct Journal {
    pub orchestrator: Arc<TurnOrchestrator>,
    pub notifier: Arc<Notifier>,
    pub store: Arc<MemoryStore>,
    pub sink: Arc<RecordingSink>,
}

pub fn journal(completion: Arc<dyn CompletionClient>) -> Journal {
    journal_with_store(completion, Arc::new(MemoryStore::new()))
}

pub fn journal_with_store(completion: Arc<dyn CompletionClient>, store: Arc<MemoryStore>) -> Journal {
    build_journal(completion, store, RecordingSink::new())
}

pub fn journal_with_sink(completion: Arc<dyn CompletionClient>, sink: Arc<RecordingSink>) -> Journal {
    build_journal(completion, Arc::new(MemoryStore::new()), sink)
}

fn build_journal(
    completion: Arc<dyn CompletionClient>,
    store: Arc<MemoryStore>,
    sink: Arc<RecordingSink>,
) -> Journal {
    let kv: Arc<dyn KeyValueStore> = store.clone();
    let events: Arc<dyn EventSink> = sink.clone();
    let notifier = Arc::new(Notifier::new(Some(events), Arc::clone(&kv)));
    let orchestrator = Arc::new(TurnOrchestrator::new(
        completion,
        Arc::clone(&notifier),
        kv,
    ));

    Journal {
        orchestrator,
        notifier,
        store,
        sink,
    }
}
