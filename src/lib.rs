pub mod audio;
pub mod backend;
pub mod config;
pub mod exercise;
pub mod recording;
pub mod session;
pub mod timer;
pub mod upload;
pub mod wizard;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame, AudioSource,
    WavCaptureDevice,
};
pub use backend::{AuthSession, Backend, BackendError, InMemoryBackend, RemoteRef, RestBackend, TaskRecord};
pub use config::Config;
pub use exercise::{ExerciseDefinition, ExerciseFlow, ExerciseSequencer, FlowError, SequenceError};
pub use recording::{CaptureDevice, CaptureError, CapturedClip, PermissionStatus, RecordingController};
pub use session::{SessionContext, SessionError, SessionStore, UserId};
pub use timer::{format_countdown, Clock, CountdownTimer, ManualClock, TimerState, TokioClock};
pub use upload::{PartialFailurePolicy, UploadError, UploadPipeline, UploadReceipt};
pub use wizard::{Alert, AlertKind, ProfileForm, RecordingTask, WizardStep};
