pub mod audio;
pub mod completion;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod host;
pub mod http;
pub mod notify;
pub mod orchestrator;
pub mod session;
pub mod speech;
pub mod storage;

pub use audio::{AudioBackend, AudioBackendConfig, AudioCapture, AudioFrame, LevelMeter};
pub use completion::{ChatCompletionClient, CompletionClient};
pub use config::Config;
pub use error::{CallError, CaptureError, CompletionError, RecognitionError};
pub use heuristics::{detect_mood, extract_topics, Mood, Topic};
pub use host::{BridgeHost, HostPlatform};
pub use http::{create_router, AppState};
pub use notify::{EventKind, EventSink, JournalEvent, Notifier, WebhookSink};
pub use orchestrator::{ConversationContext, ConversationTurn, ReplySource, TurnOrchestrator};
pub use session::{CallConfig, CallSession, CallSnapshot, CallStatus};
pub use speech::{SpeechOutput, SpeechToTextSession, SttEvent, SttState};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
