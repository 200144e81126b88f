//! Speech in and out
//!
//! - `recognizer` / `synthesizer`: host capability traits
//! - `stt`: continuous dictation session with auto-restart
//! - `output`: single-utterance speech output

pub mod output;
pub mod recognizer;
pub mod stt;
pub mod synthesizer;

pub use output::SpeechOutput;
pub use recognizer::{
    BatchTranscript, RecognitionBatch, RecognitionEvent, RecognitionResult, SpeechRecognizer,
};
pub use stt::{SpeechToTextSession, SttEvent, SttState};
pub use synthesizer::{select_voice, SpeechSynthesizer, Utterance, Voice};
