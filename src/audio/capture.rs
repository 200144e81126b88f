use super::backend::AudioBackend;
use super::meter::LevelMeter;
use crate::error::CaptureError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Microphone capture with a live level meter
///
/// Owns the backend for the lifetime of one call.
pub struct AudioCapture {
    backend: Box<dyn AudioBackend>,
    meter: LevelMeter,
    meter_task: Option<JoinHandle<()>>,
}

impl AudioCapture {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            meter: LevelMeter::new(),
            meter_task: None,
        }
    }

    /// Acquire and immediately release the microphone to surface permission
    /// failures before any call state changes
    pub async fn probe_permission(&mut self) -> Result<(), CaptureError> {
        debug!("Probing microphone permission via {}", self.backend.name());

        let rx = self.backend.start().await?;
        drop(rx);

        if let Err(e) = self.backend.stop().await {
            error!("Failed to release microphone after probe: {}", e);
        }

        Ok(())
    }

    /// Acquire the microphone and start metering
    pub async fn acquire(&mut self) -> Result<(), CaptureError> {
        if self.meter_task.is_some() {
            return Ok(());
        }

        let mut audio_rx = self.backend.start().await?;
        let meter = self.meter.clone();

        let task = tokio::spawn(async move {
            debug!("Level meter task started");
            while let Some(frame) = audio_rx.recv().await {
                meter.update(&frame.frequency_bins);
            }
            meter.reset();
            debug!("Level meter task stopped");
        });

        self.meter_task = Some(task);
        info!("Microphone acquired ({})", self.backend.name());

        Ok(())
    }

    pub fn current_level(&self) -> f32 {
        self.meter.current()
    }

    pub fn is_capturing(&self) -> bool {
        self.backend.is_capturing()
    }

    /// Stop the stream, tear down the meter and reset the level; idempotent
    pub async fn release(&mut self) {
        if let Some(task) = self.meter_task.take() {
            task.abort();
            let _ = task.await;
        }

        if self.backend.is_capturing() {
            if let Err(e) = self.backend.stop().await {
                error!("Failed to release microphone: {}", e);
            } else {
                info!("Microphone released");
            }
        }

        self.meter.reset();
    }
}
