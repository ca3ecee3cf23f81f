//! Participant wizard: login, profile, reading task, vowel task
//!
//! Each step takes the `SessionContext` explicitly and only advances when its
//! backend call succeeded.

mod alert;
mod login;
mod profile;
mod steps;
mod tasks;

pub use alert::{Alert, AlertKind};
pub use login::{login, validate_keycode, ValidationError, MAX_KEYCODE_LEN, MIN_KEYCODE_LEN};
pub use profile::{submit_profile, ProfileForm};
pub use steps::WizardStep;
pub use tasks::{capture_device, submit_recordings, RecordingStep, RecordingTask};
