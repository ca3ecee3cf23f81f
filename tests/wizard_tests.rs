// Integration tests for the wizard steps against the in-memory backend

mod common;

use anyhow::Result;
use common::ScriptedDevice;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use voice_study::backend::{Backend, BackendError, InMemoryBackend};
use voice_study::recording::CapturedClip;
use voice_study::session::{SessionContext, SessionError, SessionStore, UserId};
use voice_study::config::TasksConfig;
use voice_study::upload::{PartialFailurePolicy, UploadError, UploadPipeline};
use voice_study::wizard::{self, Alert, AlertKind, ProfileForm, RecordingStep, RecordingTask, ValidationError};

fn backend() -> InMemoryBackend {
    InMemoryBackend::new("https://study.example").with_keycode("123456", "user-1", "user-1@example.invalid")
}

#[tokio::test]
async fn test_login_persists_user() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = SessionStore::new(temp_dir.path().join("session.json"));
    let backend = backend();

    let session = wizard::login(&backend, &store, " 123456 ").await?;

    assert_eq!(session.user_id(), Some(&UserId::new("user-1")));
    assert_eq!(session.access_token(), Some("memory-token-user-1"));

    let restored = store.load();
    assert_eq!(restored.user_id(), Some(&UserId::new("user-1")));
    assert_eq!(restored.access_token(), Some("memory-token-user-1"));

    store.clear()?;
    assert!(!store.load().is_logged_in());

    Ok(())
}

#[tokio::test]
async fn test_short_keycode_rejected_before_backend() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = SessionStore::new(temp_dir.path().join("session.json"));

    let err = wizard::login(&backend(), &store, "12").await.unwrap_err();

    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::KeycodeTooShort)
    );
    assert!(!store.path().exists());

    let alert = Alert::from_error(&err);
    assert_eq!(alert.kind, AlertKind::Validation);

    Ok(())
}

#[tokio::test]
async fn test_unknown_keycode_alert() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = SessionStore::new(temp_dir.path().join("session.json"));

    let err = wizard::login(&backend(), &store, "999999").await.unwrap_err();

    assert_eq!(err.downcast_ref::<BackendError>(), Some(&BackendError::InvalidKeycode));
    let alert = Alert::from_error(&err);
    assert_eq!(alert.kind, AlertKind::Remote);
    assert_eq!(alert.message, "Invalid keycode. Please try again.");
    assert!(!store.load().is_logged_in());

    Ok(())
}

#[tokio::test]
async fn test_profile_requires_login() -> Result<()> {
    let form = ProfileForm {
        age: "67".to_string(),
        gender: "female".to_string(),
        pd_status: "diagnosed".to_string(),
    };

    let err = wizard::submit_profile(&backend(), &SessionContext::anonymous(), &form)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::NotLoggedIn)
    ));
    assert_eq!(Alert::from_error(&err).message, "No user ID found. Please login again.");

    Ok(())
}

#[tokio::test]
async fn test_profile_saved_for_user() -> Result<()> {
    let backend = backend();
    let session = SessionContext::for_user(UserId::new("user-1"));
    let form = ProfileForm {
        age: " 67 ".to_string(),
        gender: "female".to_string(),
        pd_status: "diagnosed".to_string(),
    };

    wizard::submit_profile(&backend, &session, &form).await?;

    let record = backend.get_latest_record(&UserId::new("user-1")).await?;
    assert_eq!(record.age, Some(67));
    assert_eq!(record.gender.as_deref(), Some("female"));
    assert_eq!(record.pd_status.as_deref(), Some("diagnosed"));

    Ok(())
}

#[tokio::test]
async fn test_vowel_recordings_submitted() -> Result<()> {
    let backend = Arc::new(backend());
    let pipeline = UploadPipeline::new(backend.clone(), PartialFailurePolicy::Keep);
    let session = SessionContext::for_user(UserId::new("user-1"));

    let clips: Vec<CapturedClip> = ["a", "e", "i", "o", "u"]
        .iter()
        .enumerate()
        .map(|(i, v)| {
            CapturedClip::new(
                i,
                format!("vowel-{v}"),
                Duration::from_secs(5),
                Some(PathBuf::from(format!("/rec/task3-vowel-{v}.wav"))),
            )
        })
        .collect();

    let record =
        wizard::submit_recordings(RecordingTask::Vowels, &clips, &pipeline, backend.as_ref(), &session).await?;

    let urls = record.task3_recordings.expect("vowel urls should be recorded");
    assert_eq!(urls.len(), 5);
    assert!(urls[0].contains("task3-vowel-a_user-1_"));
    assert!(urls[4].contains("task3-vowel-u_user-1_"));

    let stored = backend.get_latest_record(&UserId::new("user-1")).await?;
    assert_eq!(stored.task3_recordings.map(|u| u.len()), Some(5));
    assert!(stored.task2_recording_url.is_none());

    Ok(())
}

#[tokio::test]
async fn test_failed_upload_saves_nothing() -> Result<()> {
    let backend = Arc::new(backend().fail_upload_call(0));
    let pipeline = UploadPipeline::new(backend.clone(), PartialFailurePolicy::Keep);
    let session = SessionContext::for_user(UserId::new("user-1"));
    let clips = vec![CapturedClip::new(
        0,
        "reading",
        Duration::from_secs(10),
        Some(PathBuf::from("/rec/task2-reading.wav")),
    )];

    let err = wizard::submit_recordings(RecordingTask::Reading, &clips, &pipeline, backend.as_ref(), &session)
        .await
        .unwrap_err();

    assert_eq!(Alert::from_error(&err).kind, AlertKind::Remote);
    assert!(backend.records().is_empty());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_retried_without_recording_again() -> Result<()> {
    let device = ScriptedDevice::granted();
    let log = device.log();
    let backend = Arc::new(backend().fail_upload_call(0));
    let pipeline = UploadPipeline::new(backend.clone(), PartialFailurePolicy::Keep);
    let session = SessionContext::for_user(UserId::new("user-1"));

    let flow = RecordingTask::Reading.build_flow(&TasksConfig::default(), device.boxed(), Path::new("/tmp/clips"));
    let mut step = RecordingStep::new(RecordingTask::Reading);
    assert!(step.needs_capture());
    step.capture(flow, |_, _| {}).await?;

    let err = step.submit(&pipeline, backend.as_ref(), &session).await.unwrap_err();
    assert_eq!(Alert::from_error(&err).kind, AlertKind::Remote);
    assert!(!step.needs_capture(), "clips should be kept after a remote failure");
    assert_eq!(step.recorded().len(), 1);

    // Second attempt uploads the same clip
    let record = step.submit(&pipeline, backend.as_ref(), &session).await?;
    assert!(record.task2_recording_url.is_some());
    assert!(step.needs_capture());

    assert_eq!(log.opens(), 1, "the reading was recorded only once");
    assert_eq!(backend.upload_calls(), 2);
    assert_eq!(backend.records().len(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_clip_without_file_is_recorded_again() -> Result<()> {
    let backend = Arc::new(backend());
    let pipeline = UploadPipeline::new(backend.clone(), PartialFailurePolicy::Keep);
    let session = SessionContext::for_user(UserId::new("user-1"));

    let device = ScriptedDevice::granted().without_file().boxed();
    let flow = RecordingTask::Reading.build_flow(&TasksConfig::default(), device, Path::new("/tmp/clips"));
    let mut step = RecordingStep::new(RecordingTask::Reading);
    step.capture(flow, |_, _| {}).await?;

    let err = step.submit(&pipeline, backend.as_ref(), &session).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<UploadError>(),
        Some(UploadError::MissingFile { index: 0, .. })
    ));
    assert!(step.needs_capture());
    assert_eq!(backend.upload_calls(), 0);

    Ok(())
}
