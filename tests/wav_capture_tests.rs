// Integration tests for WAV capture
//
// These run in real time with short captures and write into a temporary
// directory, then read the result back with `AudioFile`.

use anyhow::Result;
use std::time::Duration;
use tempfile::TempDir;
use voice_study::audio::{AudioBackendConfig, AudioFile, AudioSource, WavCaptureDevice};
use voice_study::exercise::{ExerciseDefinition, ExerciseFlow};
use voice_study::recording::{CaptureDevice, PermissionStatus, RecordingController};
use voice_study::timer::CountdownTimer;

fn tone_device() -> WavCaptureDevice {
    WavCaptureDevice::new(
        AudioSource::Tone { frequency_hz: 440.0 },
        AudioBackendConfig::default(),
        PermissionStatus::Granted,
    )
}

#[tokio::test]
async fn test_tone_capture_writes_wav() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let target = temp_dir.path().join("clips").join("task2-reading.wav");

    let mut device = tone_device();
    assert_eq!(device.request_permission().await?, PermissionStatus::Granted);

    device.open(&target).await?;
    assert!(device.is_capturing());
    tokio::time::sleep(Duration::from_millis(450)).await;
    let output = device.finalize().await?;

    assert!(!device.is_capturing());
    let file = output.file.expect("capture should produce a file");
    assert_eq!(file, target);
    assert!(output.duration > Duration::ZERO);

    let audio = AudioFile::open(&file)?;
    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert!(audio.duration_seconds > 0.1, "too short: {}", audio.duration_seconds);
    assert!(audio.samples.iter().any(|&s| s != 0), "tone should not be silent");

    Ok(())
}

#[tokio::test]
async fn test_finalize_without_open_fails() -> Result<()> {
    let mut device = tone_device();
    assert!(device.finalize().await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_denied_access_reported() -> Result<()> {
    let mut device = WavCaptureDevice::new(
        AudioSource::Silence,
        AudioBackendConfig::default(),
        PermissionStatus::Denied,
    );
    assert_eq!(device.request_permission().await?, PermissionStatus::Denied);
    Ok(())
}

#[tokio::test]
async fn test_file_source_replays_recording() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let original = temp_dir.path().join("original.wav");
    let replayed = temp_dir.path().join("replayed.wav");

    let mut device = tone_device();
    device.open(&original).await?;
    tokio::time::sleep(Duration::from_millis(350)).await;
    device.finalize().await?;

    let mut device = WavCaptureDevice::new(
        AudioSource::File(original.display().to_string()),
        AudioBackendConfig::default(),
        PermissionStatus::Granted,
    );
    device.open(&replayed).await?;
    tokio::time::sleep(Duration::from_millis(250)).await;
    let output = device.finalize().await?;

    let audio = AudioFile::open(output.file.expect("replay should produce a file"))?;
    assert_eq!(audio.sample_rate, 16000);
    assert!(!audio.samples.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_flow_with_wav_device() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let controller = RecordingController::new(
        Box::new(tone_device()),
        CountdownTimer::default(),
        temp_dir.path(),
        "task2",
    );
    let mut flow = ExerciseFlow::new(
        vec![ExerciseDefinition::new(0, "reading", Duration::from_millis(500))],
        controller,
    );

    flow.run_exercise(0, |_| {}).await?;

    let clips = flow.into_clips();
    assert_eq!(clips.len(), 1);
    let file = clips[0].file_reference().expect("clip should have a file");
    assert!(file.exists());
    assert!(file.starts_with(temp_dir.path()));

    let audio = AudioFile::open(file)?;
    assert!(audio.duration() > Duration::from_millis(200));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_reading_clip_matches_exercise_window() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let controller = RecordingController::new(
        Box::new(tone_device()),
        CountdownTimer::default(),
        temp_dir.path(),
        "task2",
    );
    let mut flow = ExerciseFlow::new(ExerciseDefinition::reading(Duration::from_secs(10)), controller);

    flow.run_exercise(0, |_| {}).await?;

    let clips = flow.into_clips();
    let clip = &clips[0];
    assert_eq!(clip.duration_label(), "0:10");
    assert!(
        clip.duration() >= Duration::from_millis(9_900) && clip.duration() <= Duration::from_secs(10),
        "captured {:?}",
        clip.duration()
    );

    let audio = AudioFile::open(clip.file_reference().expect("clip should have a file"))?;
    assert!(audio.duration() <= Duration::from_secs(10));

    Ok(())
}

#[tokio::test]
async fn test_zero_sample_rate_fails_without_panic() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = AudioBackendConfig {
        target_sample_rate: 0,
        ..AudioBackendConfig::default()
    };
    let mut device = WavCaptureDevice::new(AudioSource::Silence, config, PermissionStatus::Granted);

    device.open(&temp_dir.path().join("broken.wav")).await?;
    tokio::time::sleep(Duration::from_millis(250)).await;

    let err = device.finalize().await.unwrap_err();
    assert!(!format!("{:#}", err).contains("panicked"), "writer panicked: {:#}", err);

    Ok(())
}
