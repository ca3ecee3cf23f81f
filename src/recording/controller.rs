use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::clip::CapturedClip;
use super::device::{CaptureDevice, PermissionStatus};
use super::handle::{OpenFailure, RecordingHandle};
use crate::exercise::ExerciseDefinition;
use crate::timer::{CountdownTimer, TimerEvents};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Microphone access is required to record")]
    PermissionDenied,

    #[error("A recording is already in progress")]
    AlreadyCapturing,

    #[error("Capture device unavailable")]
    DeviceUnavailable,

    #[error("Could not check microphone access: {0}")]
    PermissionCheck(String),

    #[error("Could not start recording: {0}")]
    Open(String),
}

/// Owns the capture device and the ordered list of finished clips
///
/// At any time the device is either idle here or inside the one open
/// [`RecordingHandle`].
pub struct RecordingController {
    device: Option<Box<dyn CaptureDevice>>,
    handle: Option<RecordingHandle>,
    clips: Vec<CapturedClip>,
    timer: CountdownTimer,
    output_dir: PathBuf,
    task_prefix: String,
}

impl RecordingController {
    /// `task_prefix` leads every clip file name (`task2`, `task3`)
    pub fn new(
        device: Box<dyn CaptureDevice>,
        timer: CountdownTimer,
        output_dir: impl Into<PathBuf>,
        task_prefix: impl Into<String>,
    ) -> Self {
        Self {
            device: Some(device),
            handle: None,
            clips: Vec::new(),
            timer,
            output_dir: output_dir.into(),
            task_prefix: task_prefix.into(),
        }
    }

    /// Request access, open a capture and start the exercise countdown
    pub async fn begin_capture(
        &mut self,
        exercise: &ExerciseDefinition,
    ) -> Result<TimerEvents, CaptureError> {
        if self.handle.is_some() {
            return Err(CaptureError::AlreadyCapturing);
        }

        let mut device = self.device.take().ok_or(CaptureError::DeviceUnavailable)?;

        match device.request_permission().await {
            Ok(PermissionStatus::Granted) => {}
            Ok(PermissionStatus::Denied) => {
                warn!("Microphone access denied; '{}' not started", exercise.name);
                self.device = Some(device);
                return Err(CaptureError::PermissionDenied);
            }
            Err(e) => {
                self.device = Some(device);
                return Err(CaptureError::PermissionCheck(format!("{:#}", e)));
            }
        }

        let target = self.clip_path(exercise);

        let handle = match RecordingHandle::open(device, exercise.clone(), target).await {
            Ok(handle) => handle,
            Err(OpenFailure { device, error }) => {
                self.device = Some(device);
                return Err(CaptureError::Open(format!("{:#}", error)));
            }
        };

        self.handle = Some(handle);
        Ok(self.timer.start(exercise.duration))
    }

    /// Finalize the open capture into a clip
    ///
    /// Returns `None` when nothing is open, so a duplicate expiry is harmless.
    pub async fn on_expiry(&mut self) -> Option<&CapturedClip> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => {
                debug!("Expiry with no open capture; ignoring");
                return None;
            }
        };

        self.timer.reset();
        let (device, clip) = handle.finalize().await;
        self.device = Some(device);
        self.clips.push(clip);
        self.clips.last()
    }

    /// Finalize and discard an open capture; returns whether one was open
    pub async fn abort(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };

        self.timer.reset();
        info!("Discarding capture of '{}'", handle.exercise().name);
        let (device, _discarded) = handle.finalize().await;
        self.device = Some(device);
        true
    }

    pub fn is_capturing(&self) -> bool {
        self.handle.is_some()
    }

    /// Exercise currently being recorded
    pub fn active_exercise(&self) -> Option<&ExerciseDefinition> {
        self.handle.as_ref().map(RecordingHandle::exercise)
    }

    pub fn clips(&self) -> &[CapturedClip] {
        &self.clips
    }

    pub fn into_clips(self) -> Vec<CapturedClip> {
        self.clips
    }

    fn clip_path(&self, exercise: &ExerciseDefinition) -> PathBuf {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.output_dir.join(format!(
            "{}-{}-{}.wav",
            self.task_prefix,
            exercise.name,
            &id[..8]
        ))
    }
}
