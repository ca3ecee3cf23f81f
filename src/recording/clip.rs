use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A finalized recording produced by one exercise
///
/// An absent file reference means the device produced nothing usable; the
/// upload pipeline refuses such clips.
#[derive(Debug, PartialEq, Serialize)]
pub struct CapturedClip {
    ordinal: usize,
    name: String,
    duration: Duration,
    duration_label: String,
    file_reference: Option<PathBuf>,
    recorded_at: DateTime<Utc>,
}

impl CapturedClip {
    pub fn new(
        ordinal: usize,
        name: impl Into<String>,
        duration: Duration,
        file_reference: Option<PathBuf>,
    ) -> Self {
        Self {
            ordinal,
            name: name.into(),
            duration,
            duration_label: format_length(duration),
            file_reference,
            recorded_at: Utc::now(),
        }
    }

    /// When capture of this clip began (defaults to creation time)
    pub fn with_recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = at;
        self
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Human-readable capture length (`m:ss`)
    pub fn duration_label(&self) -> &str {
        &self.duration_label
    }

    pub fn file_reference(&self) -> Option<&Path> {
        self.file_reference.as_deref()
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Capture length as `m:ss`, to the nearest second
///
/// Frame pacing leaves a clip a buffer short or long of its window, so a
/// 10 s exercise reads `0:10` whether 9.9 s or 10.05 s were written.
fn format_length(duration: Duration) -> String {
    let total_secs = (duration.as_millis() + 500) / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
