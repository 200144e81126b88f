// Tests for microphone capture and the level meter

mod common;

use anyhow::Result;
use common::{wait_until, FakeMicrophone, MicControl};
use std::sync::atomic::Ordering;
use std::time::Duration;
use voice_journal::audio::{frame_level, AudioCapture, LevelMeter};
use voice_journal::error::CaptureError;

#[test]
fn test_frame_level_normalization() {
    assert_eq!(frame_level(&[]), 0.0);
    assert_eq!(frame_level(&[0, 0, 0, 0]), 0.0);
    assert_eq!(frame_level(&[64, 64]), 0.5);
    assert_eq!(frame_level(&[128, 128]), 1.0);
    // Clamped at full scale
    assert_eq!(frame_level(&[255, 255, 255]), 1.0);
}

#[test]
fn test_level_meter_reset() {
    let meter = LevelMeter::new();
    meter.update(&[32, 32]);
    assert_eq!(meter.current(), 0.25);

    meter.reset();
    assert_eq!(meter.current(), 0.0);
}

#[tokio::test]
async fn test_probe_releases_microphone() -> Result<()> {
    let mic = MicControl::new(true);
    let mut capture = AudioCapture::new(Box::new(FakeMicrophone::new(mic.clone())));

    capture.probe_permission().await?;

    assert_eq!(mic.opens.load(Ordering::SeqCst), 1);
    assert!(!mic.is_open());
    assert!(!capture.is_capturing());
    Ok(())
}

#[tokio::test]
async fn test_probe_reports_denial() {
    let mic = MicControl::new(false);
    let mut capture = AudioCapture::new(Box::new(FakeMicrophone::new(mic)));

    let result = capture.probe_permission().await;

    assert!(matches!(result, Err(CaptureError::PermissionDenied)));
}

#[tokio::test]
async fn test_acquire_meters_frames() -> Result<()> {
    let mic = MicControl::new(true);
    let mut capture = AudioCapture::new(Box::new(FakeMicrophone::new(mic.clone())));

    capture.acquire().await?;
    assert!(capture.is_capturing());

    assert!(mic.push(vec![64; 8]).await);
    assert!(wait_until(Duration::from_secs(1), || capture.current_level() == 0.5).await);

    capture.release().await;
    Ok(())
}

#[tokio::test]
async fn test_release_is_idempotent_and_resets_level() -> Result<()> {
    let mic = MicControl::new(true);
    let mut capture = AudioCapture::new(Box::new(FakeMicrophone::new(mic.clone())));

    capture.acquire().await?;
    mic.push(vec![200; 4]).await;
    assert!(wait_until(Duration::from_secs(1), || capture.current_level() == 1.0).await);

    capture.release().await;
    assert_eq!(capture.current_level(), 0.0);
    assert!(!mic.is_open());

    capture.release().await;
    assert_eq!(capture.current_level(), 0.0);
    assert!(!capture.is_capturing());
    Ok(())
}
