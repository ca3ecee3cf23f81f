use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::context::{SessionContext, UserId};

/// On-disk form of the session
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    saved_at: DateTime<Utc>,
}

/// Keeps the logged-in user between runs
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved session; a missing or unreadable file means logged out
    pub fn load(&self) -> SessionContext {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(_) => return SessionContext::anonymous(),
        };

        match serde_json::from_slice::<StoredSession>(&raw) {
            Ok(stored) => SessionContext::for_user(stored.user_id).with_access_token(stored.access_token),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                SessionContext::anonymous()
            }
        }
    }

    /// Remember the user and, when the backend issued one, their token
    pub fn save(&self, user_id: &UserId, access_token: Option<&str>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Failed to create session directory")?;
        }

        let stored = StoredSession {
            user_id: user_id.clone(),
            access_token: access_token.map(str::to_string),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&stored)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;

        info!("Session saved for user {}", user_id);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove session file"),
        }
    }
}
