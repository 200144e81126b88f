use crate::error::CaptureError;
use anyhow::Result;
use tokio::sync::mpsc;

/// One analyser snapshot of the microphone signal
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Frequency-bin magnitudes, 0..=255 per bin
    pub frequency_bins: Vec<u8>,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Frames buffered between the backend and the level meter
    pub frame_buffer: usize,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self { frame_buffer: 64 }
    }
}

/// Microphone capture backend trait
///
/// Implementations:
/// - Bridge: frames pushed by a browser client over HTTP
/// - Test fakes: scripted frames and permission outcomes
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Acquire the microphone
    ///
    /// Returns a channel receiver that will receive analyser frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError>;

    /// Release the microphone; safe to call when not capturing
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
