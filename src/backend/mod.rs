//! Managed backend consumed by the wizard
//!
//! The backend owns authentication, the `records` table and the
//! `recordings` storage bucket. This crate only speaks its request/response
//! contract:
//! - `verify_keycode` - keycode login
//! - `save_task_data` - insert a record row
//! - `upload_audio_recording` / `remove_audio_recording` - storage objects
//! - `get_latest_record` - newest row for a user

mod memory;
mod messages;
mod rest;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub use memory::InMemoryBackend;
pub use messages::{content_type, object_name, AuthSession, RemoteRef, StoredRecord, TaskRecord};
pub use rest::RestBackend;

use crate::config::{BackendConfig, BackendKind};
use crate::session::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Invalid keycode")]
    InvalidKeycode,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Record not found")]
    NotFound,

    #[error("Failed to save record: {0}")]
    Save(String),

    #[error("Failed to upload recording: {0}")]
    Upload(String),

    #[error("Failed to fetch record: {0}")]
    Fetch(String),
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn verify_keycode(&self, keycode: &str) -> Result<AuthSession, BackendError>;

    async fn save_task_data(&self, record: &TaskRecord) -> Result<(), BackendError>;

    async fn upload_audio_recording(
        &self,
        user_id: &UserId,
        file: &Path,
    ) -> Result<RemoteRef, BackendError>;

    async fn remove_audio_recording(&self, remote: &RemoteRef) -> Result<(), BackendError>;

    async fn get_latest_record(&self, user_id: &UserId) -> Result<StoredRecord, BackendError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Build the configured backend, resuming a saved login token if there is one
pub fn connect(config: &BackendConfig, access_token: Option<&str>) -> anyhow::Result<Arc<dyn Backend>> {
    match config.kind {
        BackendKind::Rest => {
            let mut backend = RestBackend::new(config)?;
            if let Some(token) = access_token {
                backend = backend.with_access_token(token);
            }
            Ok(Arc::new(backend))
        }
        BackendKind::Memory => {
            let mut backend = InMemoryBackend::new(&config.url);
            for (code, user) in &config.demo_keycodes {
                backend = backend.with_keycode(code, user, format!("{user}@example.invalid"));
            }
            Ok(Arc::new(backend))
        }
    }
}
