use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::info;

use super::messages::{object_name, AuthSession, RemoteRef, StoredRecord, TaskRecord};
use super::{Backend, BackendError};
use crate::session::UserId;

#[derive(Default)]
struct MemoryState {
    keycodes: HashMap<String, (UserId, String)>,
    records: Vec<StoredRecord>,
    objects: BTreeMap<String, PathBuf>,
    upload_calls: usize,
    failing_uploads: HashSet<usize>,
}

/// Backend kept entirely in memory
///
/// Used for offline runs and as the test double for the upload pipeline.
/// Uploads can be made to fail on chosen call numbers.
pub struct InMemoryBackend {
    base_url: String,
    upload_delay: Duration,
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            upload_delay: Duration::ZERO,
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn with_keycode(
        self,
        keycode: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.lock()
            .keycodes
            .insert(keycode.into(), (UserId::new(user_id), email.into()));
        self
    }

    /// Make the upload with this 0-based call number fail
    pub fn fail_upload_call(self, call: usize) -> Self {
        self.lock().failing_uploads.insert(call);
        self
    }

    /// Hold every upload for `delay` before answering
    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    /// Number of upload attempts so far, failed ones included
    pub fn upload_calls(&self) -> usize {
        self.lock().upload_calls
    }

    /// Stored objects: object path -> local source file
    pub fn objects(&self) -> BTreeMap<String, PathBuf> {
        self.lock().objects.clone()
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.lock().records.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/recordings/{}",
            self.base_url.trim_end_matches('/'),
            object_path
        )
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn verify_keycode(&self, keycode: &str) -> Result<AuthSession, BackendError> {
        let state = self.lock();
        let (user_id, email) = state
            .keycodes
            .get(keycode)
            .cloned()
            .ok_or(BackendError::InvalidKeycode)?;

        Ok(AuthSession {
            access_token: Some(format!("memory-token-{user_id}")),
            user_id,
            email,
        })
    }

    async fn save_task_data(&self, record: &TaskRecord) -> Result<(), BackendError> {
        let user_id = record
            .user_id
            .clone()
            .ok_or_else(|| BackendError::Save("user_id is required".to_string()))?;

        let mut state = self.lock();
        let id = state.records.len() as i64 + 1;
        state.records.push(StoredRecord {
            id: Some(id),
            user_id,
            age: record.age,
            gender: record.gender.clone(),
            pd_status: record.pd_status.clone(),
            task2_recording_url: record.task2_recording_url.clone(),
            task3_recordings: record.task3_recordings.clone(),
            created_at: Some(Utc::now()),
        });
        Ok(())
    }

    async fn upload_audio_recording(
        &self,
        user_id: &UserId,
        file: &Path,
    ) -> Result<RemoteRef, BackendError> {
        let call = {
            let mut state = self.lock();
            let call = state.upload_calls;
            state.upload_calls += 1;
            call
        };

        if !self.upload_delay.is_zero() {
            tokio::time::sleep(self.upload_delay).await;
        }

        let mut state = self.lock();
        if state.failing_uploads.contains(&call) {
            return Err(BackendError::Upload(format!("storage rejected upload #{call}")));
        }

        // Call number keeps names unique within the same millisecond
        let object_path = object_name(file, user_id, Utc::now().timestamp_millis() + call as i64);
        state.objects.insert(object_path.clone(), file.to_path_buf());
        info!("Stored {} in memory", object_path);

        Ok(RemoteRef {
            public_url: self.public_url(&object_path),
            object_path,
        })
    }

    async fn remove_audio_recording(&self, remote: &RemoteRef) -> Result<(), BackendError> {
        self.lock()
            .objects
            .remove(&remote.object_path)
            .map(|_| ())
            .ok_or_else(|| BackendError::Upload(format!("no object {}", remote.object_path)))
    }

    async fn get_latest_record(&self, user_id: &UserId) -> Result<StoredRecord, BackendError> {
        self.lock()
            .records
            .iter()
            .rev()
            .find(|r| &r.user_id == user_id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
