use super::recognizer::{RecognitionEvent, SpeechRecognizer};
use crate::error::{CallError, RecognitionError};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SttState {
    Stopped,
    Starting,
    Listening,
}

/// Output of the speech-to-text session
#[derive(Debug, Clone, PartialEq)]
pub enum SttEvent {
    /// Live view of the not-yet-final text
    Interim(String),
    /// A finalized, trimmed transcript; one per result batch at most
    Final(String),
    Error(RecognitionError),
}

/// Continuous dictation that restarts itself while the call is active
pub struct SpeechToTextSession {
    recognizer: Arc<Mutex<Box<dyn SpeechRecognizer>>>,
    restart_delay: Duration,
    active: Arc<AtomicBool>,
    state: Arc<watch::Sender<SttState>>,
    task: Option<JoinHandle<()>>,
}

impl SpeechToTextSession {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, restart_delay: Duration) -> Self {
        let (state, _) = watch::channel(SttState::Stopped);
        Self {
            recognizer: Arc::new(Mutex::new(recognizer)),
            restart_delay,
            active: Arc::new(AtomicBool::new(false)),
            state: Arc::new(state),
            task: None,
        }
    }

    pub fn state(&self) -> SttState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SttState> {
        self.state.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start dictation, forwarding transcripts and errors to `events`
    pub async fn start(&mut self, events: mpsc::Sender<SttEvent>) -> Result<(), CallError> {
        if self.is_active() {
            warn!("Speech recognition already started");
            return Ok(());
        }

        if let Some(stale) = self.task.take() {
            stale.abort();
        }

        let rx = {
            let mut recognizer = self.recognizer.lock().await;
            if !recognizer.is_supported() {
                return Err(CallError::Unsupported);
            }

            info!("Starting speech recognition ({})", recognizer.name());
            self.state.send_replace(SttState::Starting);

            match recognizer.start().await {
                Ok(rx) => rx,
                Err(e) => {
                    self.state.send_replace(SttState::Stopped);
                    return Err(CallError::Startup(format!("{:#}", e)));
                }
            }
        };

        self.active.store(true, Ordering::SeqCst);

        let task = tokio::spawn(run_recognition(
            Arc::clone(&self.recognizer),
            rx,
            Arc::clone(&self.active),
            Arc::clone(&self.state),
            events,
            self.restart_delay,
        ));
        self.task = Some(task);

        Ok(())
    }

    /// Stop dictation and suppress auto-restart; idempotent
    pub async fn stop(&mut self) {
        let was_active = self.active.swap(false, Ordering::SeqCst);
        let task = self.task.take();
        if !was_active && task.is_none() {
            return;
        }

        info!("Stopping speech recognition");

        if let Err(e) = self.recognizer.lock().await.stop().await {
            error!("Failed to stop recognizer: {}", e);
        }

        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }

        self.state.send_replace(SttState::Stopped);
    }
}

async fn run_recognition(
    recognizer: Arc<Mutex<Box<dyn SpeechRecognizer>>>,
    mut rx: mpsc::Receiver<RecognitionEvent>,
    active: Arc<AtomicBool>,
    state: Arc<watch::Sender<SttState>>,
    events: mpsc::Sender<SttEvent>,
    restart_delay: Duration,
) {
    debug!("Recognition task started");

    loop {
        while let Some(event) = rx.recv().await {
            match event {
                RecognitionEvent::Started => {
                    state.send_replace(SttState::Listening);
                    debug!("Recognizer listening");
                }
                RecognitionEvent::Results(batch) => {
                    let transcript = batch.transcript();
                    let _ = events.send(SttEvent::Interim(transcript.interim)).await;

                    if let Some(text) = transcript.finalized {
                        info!("Final transcript: {}", text);
                        let _ = events.send(SttEvent::Final(text)).await;
                    }
                }
                RecognitionEvent::Error(e) => {
                    warn!("Recognition error: {}", e);
                    if e == RecognitionError::NotAllowed {
                        // No point restarting without permission
                        active.store(false, Ordering::SeqCst);
                    }
                    let _ = events.send(SttEvent::Error(e)).await;
                }
                RecognitionEvent::Ended => break,
            }
        }

        state.send_replace(SttState::Stopped);

        if !active.load(Ordering::SeqCst) {
            break;
        }

        debug!("Recognizer ended during call, restarting in {:?}", restart_delay);
        tokio::time::sleep(restart_delay).await;

        if !active.load(Ordering::SeqCst) {
            break;
        }

        state.send_replace(SttState::Starting);
        let restarted = recognizer.lock().await.start().await;
        match restarted {
            Ok(next) => rx = next,
            Err(e) => {
                error!("Failed to restart recognizer: {:#}", e);
                state.send_replace(SttState::Stopped);
                let _ = events
                    .send(SttEvent::Error(RecognitionError::Other(
                        "restart-failed".to_string(),
                    )))
                    .await;
                break;
            }
        }
    }

    debug!("Recognition task stopped");
}
