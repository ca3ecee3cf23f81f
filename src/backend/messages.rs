use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::session::UserId;

/// Successful keycode login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: UserId,
    pub email: String,
    pub access_token: Option<String>,
}

/// Row written to the `records` table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskRecord {
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pd_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task2_recording_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task3_recordings: Option<Vec<String>>,
}

impl TaskRecord {
    pub fn for_user(user_id: &UserId) -> Self {
        Self {
            user_id: Some(user_id.clone()),
            ..Self::default()
        }
    }
}

/// Row read back from the `records` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: UserId,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub pd_status: Option<String>,
    #[serde(default)]
    pub task2_recording_url: Option<String>,
    #[serde(default)]
    pub task3_recordings: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Where an uploaded clip ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRef {
    /// Object path inside the storage bucket
    pub object_path: String,
    /// Publicly readable URL
    pub public_url: String,
}

/// `{stem}_{user}_{millis}.{ext}` for a local clip file
pub fn object_name(file: &Path, user_id: &UserId, unix_millis: i64) -> String {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("recording");
    let ext = file.extension().and_then(|s| s.to_str()).unwrap_or("wav");
    format!("{}_{}_{}.{}", stem, user_id, unix_millis, ext)
}

/// MIME type sent with an upload
pub fn content_type(file: &Path) -> &'static str {
    match file.extension().and_then(|s| s.to_str()) {
        Some("m4a") => "audio/m4a",
        Some("mp3") => "audio/mpeg",
        _ => "audio/wav",
    }
}
