//! Timed capture of exercise clips
//!
//! `RecordingController` owns the single capture device. Starting an exercise
//! moves the device into a `RecordingHandle`; the timer's expiry finalizes the
//! handle into a `CapturedClip` and hands the device back.

mod clip;
mod controller;
mod device;
mod handle;

pub use clip::CapturedClip;
pub use controller::{CaptureError, RecordingController};
pub use device::{CaptureDevice, CaptureOutput, PermissionStatus};
pub use handle::RecordingHandle;
