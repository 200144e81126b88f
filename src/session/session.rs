use super::config::CallConfig;
use super::stats::{CallSnapshot, CallStatus, ErrorView};
use crate::audio::AudioCapture;
use crate::error::{CallError, RecognitionError};
use crate::host::HostPlatform;
use crate::notify::{EventKind, Notifier};
use crate::orchestrator::{SessionGeneration, SessionGuard, TurnOrchestrator};
use crate::speech::{SpeechOutput, SpeechToTextSession, SttEvent, SttState};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Call state touched by the transcript event task
struct CallShared {
    state: StdMutex<CallState>,

    /// Sticky once granted; revoked on permission errors
    mic_permission: AtomicBool,

    /// Turns dispatched but not yet answered
    in_flight: AtomicUsize,
}

#[derive(Debug)]
struct CallState {
    status: CallStatus,
    call_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    interim: String,
    last_error: Option<CallError>,
}

impl CallShared {
    fn new() -> Self {
        Self {
            state: StdMutex::new(CallState {
                status: CallStatus::Idle,
                call_id: None,
                started_at: None,
                interim: String::new(),
                last_error: None,
            }),
            mic_permission: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, CallState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_error(&self, err: CallError) {
        if matches!(
            err,
            CallError::PermissionDenied | CallError::Recognition(RecognitionError::NotAllowed)
        ) {
            self.mic_permission.store(false, Ordering::SeqCst);
        }
        self.state().last_error = Some(err);
    }
}

/// Resources owned by one active call, dropped when it ends
struct CallResources {
    capture: AudioCapture,
    stt: SpeechToTextSession,
    speech: Arc<SpeechOutput>,
    event_task: JoinHandle<()>,
}

/// Top-level call lifecycle: idle → active → ended
///
/// Brings up capture, dictation and speech output together on start and
/// tears them down on end. Finalized transcripts are handed to the
/// orchestrator as independent tasks.
pub struct CallSession {
    config: CallConfig,
    host: Arc<dyn HostPlatform>,
    orchestrator: Arc<TurnOrchestrator>,
    notifier: Arc<Notifier>,
    generation: SessionGeneration,
    shared: Arc<CallShared>,
    resources: Mutex<Option<CallResources>>,
}

impl CallSession {
    pub fn new(
        config: CallConfig,
        host: Arc<dyn HostPlatform>,
        orchestrator: Arc<TurnOrchestrator>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            config,
            host,
            orchestrator,
            notifier,
            generation: SessionGeneration::new(),
            shared: Arc::new(CallShared::new()),
            resources: Mutex::new(None),
        }
    }

    /// Start a call
    ///
    /// Fails with `PermissionDenied` or `Unsupported` without leaving any
    /// resource running; the error is also kept as `last_error`.
    pub async fn start(&self) -> Result<CallSnapshot, CallError> {
        self.start_with(|| {}).await
    }

    /// Start a call, running `prepare` first once no other call is active.
    ///
    /// `prepare` is where the host gets configured for the new call; a
    /// rejected start never reaches it.
    pub async fn start_with<F>(&self, prepare: F) -> Result<CallSnapshot, CallError>
    where
        F: FnOnce() + Send,
    {
        let mut resources = self.resources.lock().await;
        if resources.is_some() {
            warn!("Call already active");
            return Err(CallError::AlreadyActive);
        }

        prepare();

        self.shared.state().last_error = None;

        let mut capture =
            AudioCapture::new(self.host.audio_backend(self.config.audio.clone()));

        if let Err(e) = capture.probe_permission().await {
            let err = CallError::from(e);
            warn!("Microphone preflight failed: {}", err);
            self.shared.record_error(err.clone());
            return Err(err);
        }
        self.shared.mic_permission.store(true, Ordering::SeqCst);

        if let Err(e) = capture.acquire().await {
            let err = CallError::from(e);
            error!("Failed to acquire microphone: {}", err);
            capture.release().await;
            self.shared.record_error(err.clone());
            return Err(err);
        }

        let speech = Arc::new(SpeechOutput::new(
            self.host.speech_synthesizer(),
            self.config.speech.clone(),
        ));
        let mut stt = SpeechToTextSession::new(
            self.host.speech_recognizer(),
            self.config.speech.restart_delay(),
        );

        let generation = self.generation.advance();
        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer);

        if let Err(err) = stt.start(events_tx).await {
            error!("Failed to start speech recognition: {}", err);
            speech.stop().await;
            capture.release().await;
            self.shared.record_error(err.clone());
            return Err(err);
        }

        self.orchestrator.begin_session().await;

        let call_id = format!("call-{}", uuid::Uuid::new_v4());
        {
            let mut state = self.shared.state();
            state.status = CallStatus::Active;
            state.call_id = Some(call_id.clone());
            state.started_at = Some(Utc::now());
            state.interim.clear();
        }

        let event_task = tokio::spawn(handle_transcripts(
            events_rx,
            Arc::clone(&self.shared),
            Arc::clone(&self.orchestrator),
            Arc::clone(&speech),
            self.generation.guard(),
        ));

        *resources = Some(CallResources {
            capture,
            stt,
            speech,
            event_task,
        });
        drop(resources);

        info!("Call {} started (generation {})", call_id, generation);

        self.notifier.notify(EventKind::CallStarted, json!({ "callId": call_id }));

        Ok(self.snapshot().await)
    }

    /// End the active call; `None` when there is none
    pub async fn end(&self) -> Option<CallSnapshot> {
        let mut resources = self.resources.lock().await;
        let Some(mut active) = resources.take() else {
            warn!("No active call to end");
            return None;
        };

        // In-flight turns from this call are dropped from here on
        self.generation.advance();

        active.stt.stop().await;
        active.speech.stop().await;
        active.capture.release().await;
        active.event_task.abort();
        drop(resources);

        let summary = self.orchestrator.finish_session().await;

        let call_id = {
            let mut state = self.shared.state();
            state.status = CallStatus::Ended;
            state.interim.clear();
            state.call_id.clone()
        };

        info!(
            "Call {} ended ({} turns)",
            call_id.as_deref().unwrap_or("unknown"),
            summary.turns
        );

        self.notifier.notify(
            EventKind::CallEnded,
            json!({
                "callId": call_id,
                "sessionProgress": summary.progress,
                "turnsProcessed": summary.turns,
            }),
        );

        Some(self.snapshot().await)
    }

    pub fn is_active(&self) -> bool {
        self.shared.state().status == CallStatus::Active
    }

    pub fn dismiss_error(&self) {
        self.shared.state().last_error = None;
    }

    pub fn last_error(&self) -> Option<CallError> {
        self.shared.state().last_error.clone()
    }

    pub async fn snapshot(&self) -> CallSnapshot {
        let (listening, speaking, audio_level) = {
            let resources = self.resources.lock().await;
            match resources.as_ref() {
                Some(active) => (
                    active.stt.state() == SttState::Listening,
                    active.speech.is_speaking(),
                    active.capture.current_level(),
                ),
                None => (false, false, 0.0),
            }
        };

        let summary = self.orchestrator.session_summary().await;
        let state = self.shared.state();

        CallSnapshot {
            call_id: state.call_id.clone(),
            status: state.status,
            started_at: state.started_at,
            mic_permission_granted: self.shared.mic_permission.load(Ordering::SeqCst),
            listening,
            speaking,
            processing: self.shared.in_flight.load(Ordering::SeqCst) > 0,
            audio_level,
            interim_transcript: state.interim.clone(),
            last_error: state.last_error.as_ref().map(ErrorView::from),
            session_progress: summary.progress,
            turns_processed: summary.turns,
        }
    }
}

/// Route dictation output: interim text to state, errors to `last_error`,
/// and each final transcript to its own turn task
async fn handle_transcripts(
    mut events: mpsc::Receiver<SttEvent>,
    shared: Arc<CallShared>,
    orchestrator: Arc<TurnOrchestrator>,
    speech: Arc<SpeechOutput>,
    guard: SessionGuard,
) {
    while let Some(event) = events.recv().await {
        match event {
            SttEvent::Interim(text) => {
                shared.state().interim = text;
            }
            SttEvent::Final(text) => {
                shared.state().interim.clear();
                shared.in_flight.fetch_add(1, Ordering::SeqCst);

                let shared = Arc::clone(&shared);
                let orchestrator = Arc::clone(&orchestrator);
                let speech = Arc::clone(&speech);
                let guard = guard.clone();

                tokio::spawn(async move {
                    let turn = orchestrator.process_turn_guarded(&text, &guard).await;
                    shared.in_flight.fetch_sub(1, Ordering::SeqCst);

                    if let Some(turn) = turn {
                        if guard.is_current() {
                            speech.speak(&turn.ai_response).await;
                        }
                    }
                });
            }
            SttEvent::Error(e) => {
                shared.record_error(CallError::Recognition(e));
            }
        }
    }
}
