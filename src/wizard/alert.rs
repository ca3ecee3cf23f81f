use std::fmt;

use super::login::ValidationError;
use crate::backend::BackendError;
use crate::exercise::{FlowError, SequenceError};
use crate::recording::CaptureError;
use crate::session::SessionError;
use crate::upload::UploadError;

/// How a failure is presented to the participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// Bad input; shown inline, nothing was attempted
    Validation,
    /// Microphone access refused
    Permission,
    /// Something required was missing (file, identity, recordings)
    Precondition,
    /// Backend or network failure
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

const GENERIC_MESSAGE: &str = "An error occurred. Please try again.";

impl Alert {
    fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify the first recognised error in the chain
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<ValidationError>() {
                return Self::new(AlertKind::Validation, e.to_string());
            }
            if let Some(e) = cause.downcast_ref::<FlowError>() {
                return Self::from_flow(e);
            }
            if let Some(e) = cause.downcast_ref::<CaptureError>() {
                return Self::from_capture(e);
            }
            if let Some(e) = cause.downcast_ref::<SequenceError>() {
                return Self::new(AlertKind::Validation, e.to_string());
            }
            if let Some(e) = cause.downcast_ref::<UploadError>() {
                return Self::from_upload(e);
            }
            if let Some(e) = cause.downcast_ref::<SessionError>() {
                return Self::new(AlertKind::Precondition, e.to_string());
            }
            if let Some(e) = cause.downcast_ref::<BackendError>() {
                return Self::from_backend(e);
            }
        }

        Self::new(AlertKind::Remote, GENERIC_MESSAGE)
    }

    fn from_flow(err: &FlowError) -> Self {
        match err {
            FlowError::Sequence(e) => Self::new(AlertKind::Validation, e.to_string()),
            FlowError::Capture(e) => Self::from_capture(e),
            FlowError::TimerCancelled => Self::new(AlertKind::Precondition, err.to_string()),
        }
    }

    fn from_capture(err: &CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied => Self::new(AlertKind::Permission, err.to_string()),
            _ => Self::new(AlertKind::Precondition, err.to_string()),
        }
    }

    fn from_upload(err: &UploadError) -> Self {
        match err {
            UploadError::Remote { cause, .. } => Self::from_backend(cause),
            _ => Self::new(AlertKind::Precondition, err.to_string()),
        }
    }

    fn from_backend(err: &BackendError) -> Self {
        let message = match err {
            BackendError::InvalidKeycode | BackendError::AuthenticationFailed => {
                "Invalid keycode. Please try again.".to_string()
            }
            BackendError::Unreachable(_) => GENERIC_MESSAGE.to_string(),
            other => other.to_string(),
        };
        Self::new(AlertKind::Remote, message)
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            AlertKind::Validation => "Check your input",
            AlertKind::Permission => "Microphone access required",
            AlertKind::Precondition | AlertKind::Remote => "Error",
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.message)
    }
}
