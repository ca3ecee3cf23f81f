use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::backend::Backend;
use crate::session::{SessionContext, SessionStore};

pub const MIN_KEYCODE_LEN: usize = 4;
pub const MAX_KEYCODE_LEN: usize = 6;

/// Input rejected before anything is sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Keycode must be at least 4 characters")]
    KeycodeTooShort,

    #[error("Keycode must be at most 6 characters")]
    KeycodeTooLong,

    #[error("Keycode must contain digits only")]
    KeycodeNotNumeric,

    #[error("Please fill in all fields ({0} is missing)")]
    MissingField(&'static str),

    #[error("Age must be a whole number, got '{0}'")]
    InvalidAge(String),
}

pub fn validate_keycode(raw: &str) -> Result<&str, ValidationError> {
    let keycode = raw.trim();
    if keycode.len() < MIN_KEYCODE_LEN {
        return Err(ValidationError::KeycodeTooShort);
    }
    if keycode.len() > MAX_KEYCODE_LEN {
        return Err(ValidationError::KeycodeTooLong);
    }
    if !keycode.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::KeycodeNotNumeric);
    }
    Ok(keycode)
}

/// Verify the keycode and remember the user
pub async fn login(backend: &dyn Backend, store: &SessionStore, raw_keycode: &str) -> Result<SessionContext> {
    let keycode = validate_keycode(raw_keycode)?;

    let auth = backend.verify_keycode(keycode).await?;
    store
        .save(&auth.user_id, auth.access_token.as_deref())
        .context("Failed to remember login")?;

    info!("Logged in as {}", auth.user_id);
    Ok(SessionContext::for_user(auth.user_id).with_access_token(auth.access_token))
}
