use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Mean bin magnitude that maps to a full-scale level
pub const FULL_SCALE_MAGNITUDE: f32 = 128.0;

/// Normalized loudness of one frame: `min(mean / 128, 1)`
pub fn frame_level(frequency_bins: &[u8]) -> f32 {
    if frequency_bins.is_empty() {
        return 0.0;
    }

    let sum: u64 = frequency_bins.iter().map(|&b| b as u64).sum();
    let mean = sum as f32 / frequency_bins.len() as f32;
    (mean / FULL_SCALE_MAGNITUDE).min(1.0)
}

/// Latest level, shared between the meter task and readers
#[derive(Debug, Clone, Default)]
pub struct LevelMeter {
    bits: Arc<AtomicU32>,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, frequency_bins: &[u8]) -> f32 {
        let level = frame_level(frequency_bins);
        self.bits.store(level.to_bits(), Ordering::Relaxed);
        level
    }

    pub fn current(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn reset(&self) {
        self.bits.store(0f32.to_bits(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_zero() {
        assert_eq!(frame_level(&[]), 0.0);
        assert_eq!(frame_level(&[0, 0, 0]), 0.0);
    }

    #[test]
    fn loud_frames_clamp_to_one() {
        assert_eq!(frame_level(&[255, 255]), 1.0);
    }

    #[test]
    fn half_scale() {
        assert!((frame_level(&[64, 64, 64, 64]) - 0.5).abs() < f32::EPSILON);
    }
}
