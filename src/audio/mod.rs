pub mod backend;
pub mod capture;
pub mod meter;

pub use backend::{AudioBackend, AudioBackendConfig, AudioFrame};
pub use capture::AudioCapture;
pub use meter::{frame_level, LevelMeter};
