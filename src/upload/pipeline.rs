use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::backend::{Backend, BackendError, RemoteRef};
use crate::recording::CapturedClip;
use crate::session::UserId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("An upload is already in progress")]
    AlreadyInFlight,

    #[error("There are no recordings to upload")]
    NoClips,

    #[error("Recording '{name}' has no audio file. Please record it again.")]
    MissingFile { index: usize, name: String },

    #[error("No user ID found. Please login again.")]
    NoIdentity,

    #[error("Upload of recording '{name}' failed: {cause}")]
    Remote {
        index: usize,
        name: String,
        cause: BackendError,
    },
}

/// What to do with already-uploaded clips when a later one fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialFailurePolicy {
    /// Leave them in storage
    #[default]
    Keep,
    /// Remove them again, best effort
    Rollback,
}

/// One successfully uploaded clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub ordinal: usize,
    pub name: String,
    pub remote: RemoteRef,
}

/// Uploads finished clips one after another
///
/// Only one `upload_all` may run at a time; a second call while one is in
/// flight is rejected, not queued.
pub struct UploadPipeline {
    backend: Arc<dyn Backend>,
    policy: PartialFailurePolicy,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however `upload_all` exits
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl UploadPipeline {
    pub fn new(backend: Arc<dyn Backend>, policy: PartialFailurePolicy) -> Self {
        Self {
            backend,
            policy,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn policy(&self) -> PartialFailurePolicy {
        self.policy
    }

    /// Upload `clips` in order, stopping at the first failure
    ///
    /// Preconditions are checked before any network call.
    pub async fn upload_all(
        &self,
        clips: &[CapturedClip],
        identity: Option<&UserId>,
    ) -> Result<Vec<UploadReceipt>, UploadError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Upload requested while another is in flight");
            return Err(UploadError::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let user_id = Self::check_preconditions(clips, identity)?;

        info!(
            "Uploading {} clip(s) for {} via {} backend",
            clips.len(),
            user_id,
            self.backend.name()
        );

        let mut receipts = Vec::with_capacity(clips.len());

        for (index, clip) in clips.iter().enumerate() {
            // Checked above; every clip has a file
            let Some(file) = clip.file_reference() else {
                return Err(UploadError::MissingFile {
                    index,
                    name: clip.name().to_string(),
                });
            };

            match self.backend.upload_audio_recording(user_id, file).await {
                Ok(remote) => {
                    info!(
                        "Uploaded clip {} ({}, recorded {}) -> {}",
                        index,
                        clip.name(),
                        clip.recorded_at().format("%H:%M:%S"),
                        remote.public_url
                    );
                    receipts.push(UploadReceipt {
                        ordinal: clip.ordinal(),
                        name: clip.name().to_string(),
                        remote,
                    });
                }
                Err(cause) => {
                    error!("Upload of clip {} ({}) failed: {}", index, clip.name(), cause);
                    self.handle_partial_failure(&receipts).await;
                    return Err(UploadError::Remote {
                        index,
                        name: clip.name().to_string(),
                        cause,
                    });
                }
            }
        }

        info!("All {} clip(s) uploaded", receipts.len());
        Ok(receipts)
    }

    fn check_preconditions<'a>(
        clips: &[CapturedClip],
        identity: Option<&'a UserId>,
    ) -> Result<&'a UserId, UploadError> {
        if clips.is_empty() {
            return Err(UploadError::NoClips);
        }

        if let Some((index, clip)) = clips
            .iter()
            .enumerate()
            .find(|(_, clip)| clip.file_reference().is_none())
        {
            return Err(UploadError::MissingFile {
                index,
                name: clip.name().to_string(),
            });
        }

        identity.ok_or(UploadError::NoIdentity)
    }

    async fn handle_partial_failure(&self, uploaded: &[UploadReceipt]) {
        if uploaded.is_empty() {
            return;
        }

        match self.policy {
            PartialFailurePolicy::Keep => {
                warn!(
                    "{} clip(s) stay uploaded after the failure; record is partially populated",
                    uploaded.len()
                );
            }
            PartialFailurePolicy::Rollback => {
                for receipt in uploaded {
                    if let Err(e) = self.backend.remove_audio_recording(&receipt.remote).await {
                        warn!("Could not roll back {}: {}", receipt.remote.object_path, e);
                    }
                }
                info!("Rolled back {} uploaded clip(s)", uploaded.len());
            }
        }
    }
}
