use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::{info, warn};

use super::clip::CapturedClip;
use super::device::CaptureDevice;
use crate::exercise::ExerciseDefinition;

/// The single open capture session
///
/// Holds the capture device for as long as the capture is open, so a second
/// handle cannot be opened until this one is finalized and the device is
/// handed back.
pub struct RecordingHandle {
    device: Box<dyn CaptureDevice>,
    exercise: ExerciseDefinition,
    target: PathBuf,
    opened_at: Instant,
    started_at: DateTime<Utc>,
}

/// Opening failed; the device is returned to its owner
pub(crate) struct OpenFailure {
    pub device: Box<dyn CaptureDevice>,
    pub error: anyhow::Error,
}

impl RecordingHandle {
    pub(crate) async fn open(
        mut device: Box<dyn CaptureDevice>,
        exercise: ExerciseDefinition,
        target: PathBuf,
    ) -> Result<Self, OpenFailure> {
        if let Err(error) = device.open(&target).await {
            return Err(OpenFailure { device, error });
        }

        info!(
            "Recording '{}' on {} device -> {}",
            exercise.name,
            device.name(),
            target.display()
        );

        Ok(Self {
            device,
            exercise,
            target,
            opened_at: Instant::now(),
            started_at: Utc::now(),
        })
    }

    /// Stop capture and turn it into a clip, releasing the device
    ///
    /// A device failure yields a clip without a file reference instead of an
    /// error, so the clip still occupies its slot in the result list.
    pub(crate) async fn finalize(mut self) -> (Box<dyn CaptureDevice>, CapturedClip) {
        let (file, duration) = match self.device.finalize().await {
            Ok(output) => (output.file, output.duration),
            Err(e) => {
                warn!(
                    "Capture of '{}' produced no file at {}: {:#}",
                    self.exercise.name,
                    self.target.display(),
                    e
                );
                (None, self.opened_at.elapsed())
            }
        };

        let clip = CapturedClip::new(self.exercise.ordinal, self.exercise.name.clone(), duration, file)
            .with_recorded_at(self.started_at);

        info!(
            "Clip '{}' finalized: {} ({})",
            clip.name(),
            clip.duration_label(),
            clip.file_reference()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "no file".to_string())
        );

        (self.device, clip)
    }

    pub fn exercise(&self) -> &ExerciseDefinition {
        &self.exercise
    }
}
