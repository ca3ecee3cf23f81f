// Integration tests for audio backends
//
// These tests verify the generated sources deliver correctly sized frames
// and shut down cleanly.

use anyhow::Result;
use std::time::Duration;
use tokio::time::Instant;
use voice_study::audio::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioSource, SignalBackend};

#[tokio::test(start_paused = true)]
async fn test_tone_backend_frames() -> Result<()> {
    let mut backend = SignalBackend::tone(AudioBackendConfig::default(), 440.0);
    let started = Instant::now();
    let mut rx = backend.start().await?;
    assert!(backend.is_capturing());

    let first = rx.recv().await.expect("first frame");
    // Nothing is emitted before a full buffer of time has passed
    assert!(started.elapsed() >= Duration::from_millis(100));
    let second = rx.recv().await.expect("second frame");

    // 100ms at 16kHz mono
    assert_eq!(first.samples.len(), 1600);
    assert_eq!(first.sample_rate, 16000);
    assert_eq!(first.channels, 1);
    assert_eq!(first.duration_ms(), 100);
    assert_eq!(second.timestamp_ms, 100);
    assert!(first.samples.iter().any(|&s| s != 0));

    backend.stop().await?;
    assert!(!backend.is_capturing());

    // Channel closes once the generator is gone
    while rx.recv().await.is_some() {}

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_silence_backend_stereo() -> Result<()> {
    let config = AudioBackendConfig {
        target_sample_rate: 8000,
        target_channels: 2,
        buffer_duration_ms: 50,
    };
    let mut backend = SignalBackend::silence(config);
    let mut rx = backend.start().await?;

    let frame = rx.recv().await.expect("frame");
    // 50ms at 8kHz, interleaved L/R
    assert_eq!(frame.samples.len(), 800);
    assert!(frame.samples.iter().all(|&s| s == 0));

    assert!(backend.start().await.is_err(), "second start should fail");
    backend.stop().await?;

    Ok(())
}

#[tokio::test]
async fn test_factory_builds_sources() -> Result<()> {
    let config = AudioBackendConfig::default();

    let tone = AudioBackendFactory::create(&AudioSource::Tone { frequency_hz: 220.0 }, config.clone())?;
    assert_eq!(tone.name(), "tone-220hz");

    let silence = AudioBackendFactory::create(&AudioSource::Silence, config.clone())?;
    assert_eq!(silence.name(), "silence");

    assert!(AudioBackendFactory::create(&AudioSource::File("/nonexistent/clip.wav".into()), config.clone()).is_err());
    assert!(AudioBackendFactory::create(&AudioSource::Microphone, config).is_err());

    Ok(())
}
