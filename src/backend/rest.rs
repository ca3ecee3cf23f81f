use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::messages::{content_type, object_name, AuthSession, RemoteRef, StoredRecord, TaskRecord};
use super::{Backend, BackendError};
use crate::config::BackendConfig;
use crate::session::UserId;

#[derive(Debug, Deserialize)]
struct KeycodeRow {
    user_id: UserId,
    email: String,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Backend over the hosted REST, auth and storage endpoints
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    access_token: RwLock<Option<String>>,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        if config.url.is_empty() {
            anyhow::bail!("backend.url must be set for the rest backend");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        info!("Using REST backend at {}", config.url);

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            bucket: config.bucket.clone(),
            access_token: RwLock::new(None),
        })
    }

    /// Resume a login from an earlier run
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        *self.access_token.get_mut() = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Public URL of an object in the recordings bucket
    pub fn public_url(&self, object_path: &str) -> String {
        self.url(&format!(
            "/storage/v1/object/public/{}/{}",
            self.bucket, object_path
        ))
    }

    /// Attach API key and the user token (anon key before login)
    async fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self.access_token.read().await;
        let bearer = token.as_deref().unwrap_or(&self.anon_key);
        request.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn error_text(response: reqwest::Response) -> String {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if text.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {text}")
        }
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn verify_keycode(&self, keycode: &str) -> Result<AuthSession, BackendError> {
        let code_filter = format!("eq.{keycode}");
        let request = self
            .client
            .get(self.url("/rest/v1/keycodes"))
            .query(&[("select", "user_id,email"), ("code", code_filter.as_str())]);

        let response = self.authorized(request).await.send().await.map_err(|e| {
            error!("Keycode lookup failed: {}", e);
            BackendError::Unreachable(e.to_string())
        })?;

        if !response.status().is_success() {
            error!("Keycode lookup rejected: {}", Self::error_text(response).await);
            return Err(BackendError::InvalidKeycode);
        }

        let rows: Vec<KeycodeRow> = response.json().await.map_err(|e| {
            error!("Unreadable keycode response: {}", e);
            BackendError::InvalidKeycode
        })?;
        let row = rows.into_iter().next().ok_or(BackendError::InvalidKeycode)?;

        // The keycode doubles as the account password
        let response = self
            .client
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant {
                email: &row.email,
                password: keycode,
            })
            .send()
            .await
            .map_err(|e| {
                error!("Auth request failed: {}", e);
                BackendError::Unreachable(e.to_string())
            })?;

        if !response.status().is_success() {
            error!("Auth rejected: {}", Self::error_text(response).await);
            return Err(BackendError::AuthenticationFailed);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|_| BackendError::AuthenticationFailed)?;

        *self.access_token.write().await = Some(token.access_token.clone());
        info!("Authenticated user {}", row.user_id);

        Ok(AuthSession {
            user_id: row.user_id,
            email: row.email,
            access_token: Some(token.access_token),
        })
    }

    async fn save_task_data(&self, record: &TaskRecord) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.url("/rest/v1/records"))
            .header("Prefer", "return=minimal")
            .json(&[record]);

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(|e| BackendError::Save(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Save(Self::error_text(response).await));
        }

        info!("Saved record for {:?}", record.user_id);
        Ok(())
    }

    async fn upload_audio_recording(
        &self,
        user_id: &UserId,
        file: &Path,
    ) -> Result<RemoteRef, BackendError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| BackendError::Upload(format!("cannot read {}: {}", file.display(), e)))?;

        let object_path = object_name(file, user_id, chrono::Utc::now().timestamp_millis());
        let request = self
            .client
            .post(self.url(&format!("/storage/v1/object/{}/{}", self.bucket, object_path)))
            .header("Content-Type", content_type(file))
            .body(bytes);

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(|e| BackendError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Upload(Self::error_text(response).await));
        }

        let public_url = self.public_url(&object_path);
        info!("Uploaded {} -> {}", file.display(), public_url);

        Ok(RemoteRef {
            object_path,
            public_url,
        })
    }

    async fn remove_audio_recording(&self, remote: &RemoteRef) -> Result<(), BackendError> {
        let request = self.client.delete(self.url(&format!(
            "/storage/v1/object/{}/{}",
            self.bucket, remote.object_path
        )));

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(|e| BackendError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Upload(Self::error_text(response).await));
        }

        info!("Removed {}", remote.object_path);
        Ok(())
    }

    async fn get_latest_record(&self, user_id: &UserId) -> Result<StoredRecord, BackendError> {
        let user_filter = format!("eq.{user_id}");
        let request = self.client.get(self.url("/rest/v1/records")).query(&[
            ("select", "*"),
            ("user_id", user_filter.as_str()),
            ("order", "created_at.desc"),
            ("limit", "1"),
        ]);

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(|e| BackendError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Fetch(Self::error_text(response).await));
        }

        let rows: Vec<StoredRecord> = response
            .json()
            .await
            .map_err(|e| BackendError::Fetch(e.to_string()))?;

        rows.into_iter().next().ok_or(BackendError::NotFound)
    }

    fn name(&self) -> &str {
        "rest"
    }
}
