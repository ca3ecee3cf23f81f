use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::audio::WavCaptureDevice;
use crate::backend::{Backend, TaskRecord};
use crate::config::{AudioConfig, TasksConfig};
use crate::exercise::{ExerciseDefinition, ExerciseFlow};
use crate::recording::{CaptureDevice, CapturedClip, RecordingController};
use crate::session::{SessionContext, UserId};
use crate::timer::{CountdownTimer, TimerState, TokioClock};
use crate::upload::{UploadError, UploadPipeline, UploadReceipt};

/// The two recording screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingTask {
    /// Read-aloud passage, one clip
    Reading,
    /// Sustained vowels, one clip per vowel
    Vowels,
}

impl RecordingTask {
    /// Prefix of clip file names
    pub fn prefix(self) -> &'static str {
        match self {
            RecordingTask::Reading => "task2",
            RecordingTask::Vowels => "task3",
        }
    }

    pub fn exercises(self, tasks: &TasksConfig) -> Vec<ExerciseDefinition> {
        match self {
            RecordingTask::Reading => ExerciseDefinition::reading(tasks.reading_duration()),
            RecordingTask::Vowels => ExerciseDefinition::vowels(&tasks.vowels, tasks.vowel_duration()),
        }
    }

    /// Record row pointing at the uploaded clips
    pub fn record(self, user_id: &UserId, receipts: &[UploadReceipt]) -> TaskRecord {
        let urls: Vec<String> = receipts.iter().map(|r| r.remote.public_url.clone()).collect();
        let mut record = TaskRecord::for_user(user_id);
        match self {
            RecordingTask::Reading => record.task2_recording_url = urls.into_iter().next(),
            RecordingTask::Vowels => record.task3_recordings = Some(urls),
        }
        record
    }

    /// Wire a flow for this task from configuration
    pub fn build_flow(
        self,
        tasks: &TasksConfig,
        device: Box<dyn CaptureDevice>,
        output_dir: &Path,
    ) -> ExerciseFlow {
        let timer = CountdownTimer::new(Arc::new(TokioClock), tasks.poll_interval());
        let controller = RecordingController::new(device, timer, output_dir, self.prefix());
        ExerciseFlow::new(self.exercises(tasks), controller)
    }
}

/// Capture device described by the audio configuration
pub fn capture_device(audio: &AudioConfig) -> Result<Box<dyn CaptureDevice>> {
    let source = audio.source().context("Invalid audio source")?;
    Ok(Box::new(WavCaptureDevice::new(
        source,
        audio.backend_config()?,
        audio.microphone_access,
    )))
}

/// Upload a finished task's clips and attach them to the participant record
///
/// The wizard only advances when this returns `Ok`.
pub async fn submit_recordings(
    task: RecordingTask,
    clips: &[CapturedClip],
    pipeline: &UploadPipeline,
    backend: &dyn Backend,
    session: &SessionContext,
) -> Result<TaskRecord> {
    let receipts = pipeline.upload_all(clips, session.user_id()).await?;
    let user_id = session.require_user()?;

    let record = task.record(user_id, &receipts);
    backend
        .save_task_data(&record)
        .await
        .context("Recordings uploaded but the record could not be saved")?;

    info!("{:?} task submitted with {} clip(s)", task, receipts.len());
    Ok(record)
}

/// One recording screen: capture once, then upload until it sticks
///
/// Finished clips stay here after a failed upload, so retrying only repeats
/// the upload.
pub struct RecordingStep {
    task: RecordingTask,
    recorded: Option<Vec<CapturedClip>>,
}

impl RecordingStep {
    pub fn new(task: RecordingTask) -> Self {
        Self {
            task,
            recorded: None,
        }
    }

    pub fn task(&self) -> RecordingTask {
        self.task
    }

    /// Whether the exercises still have to be recorded
    pub fn needs_capture(&self) -> bool {
        self.recorded.is_none()
    }

    pub fn recorded(&self) -> &[CapturedClip] {
        self.recorded.as_deref().unwrap_or_default()
    }

    /// Run every exercise of `flow` and keep the clips
    pub async fn capture<F>(&mut self, mut flow: ExerciseFlow, on_tick: F) -> Result<&[CapturedClip]>
    where
        F: FnMut(&ExerciseDefinition, &TimerState),
    {
        flow.run_all(on_tick).await?;

        let clips = flow.into_clips();
        info!("{:?} task recorded {} clip(s)", self.task, clips.len());
        Ok(self.recorded.insert(clips).as_slice())
    }

    /// Upload the kept clips and save the record
    ///
    /// Remote failures keep the clips for another attempt; clips that can
    /// never upload (a missing file) are dropped so the task is recorded again.
    pub async fn submit(
        &mut self,
        pipeline: &UploadPipeline,
        backend: &dyn Backend,
        session: &SessionContext,
    ) -> Result<TaskRecord> {
        match submit_recordings(self.task, self.recorded(), pipeline, backend, session).await {
            Ok(record) => {
                self.recorded = None;
                Ok(record)
            }
            Err(e) => {
                if matches!(
                    e.downcast_ref::<UploadError>(),
                    Some(UploadError::MissingFile { .. } | UploadError::NoClips)
                ) {
                    warn!("{:?} clips cannot be uploaded; recording again", self.task);
                    self.recorded = None;
                }
                Err(e)
            }
        }
    }
}
