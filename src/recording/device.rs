use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of asking the platform for capture access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// What a capture device reports when it is finalized
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutput {
    /// Finished recording on disk, if the device produced one
    pub file: Option<PathBuf>,

    /// Capture length as measured by the device
    pub duration: Duration,
}

/// A device that can record one clip at a time into a file
///
/// The recording controller owns exactly one device. While a clip is being
/// captured the device lives inside the open `RecordingHandle`.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Ask for capture access
    async fn request_permission(&mut self) -> Result<PermissionStatus>;

    /// Start capturing into `target`
    async fn open(&mut self, target: &Path) -> Result<()>;

    /// Stop capturing and flush the recording
    async fn finalize(&mut self) -> Result<CaptureOutput>;

    /// Device name for logging
    fn name(&self) -> &str;
}
