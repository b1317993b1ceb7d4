//! Error taxonomy for the capture and submission lifecycle.
//!
//! Permission and validation failures are surfaced to the user and never
//! touch persisted state. Upload failures are not errors at all from the
//! caller's point of view: they degrade the record and are reported in the
//! submission receipt (see [`crate::pipeline::UploadFailure`]).

use thiserror::Error;

/// Failures acquiring or driving the microphone
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The user (or platform policy) refused microphone access
    #[error("Microphone access was denied")]
    PermissionDenied,

    /// No usable capture device
    #[error("Microphone unavailable: {0}")]
    DeviceUnavailable(String),

    /// Operation not valid in the recorder's current state
    #[error("Cannot {op} while recorder is {state}")]
    InvalidState {
        op: &'static str,
        state: &'static str,
    },

    /// Recorded chunks could not be encoded into a clip
    #[error("Failed to finalize recording: {0}")]
    Encode(String),
}

impl CaptureError {
    /// Message suitable for a transient user notification
    pub fn user_hint(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Please allow microphone access to record voice notes.",
            Self::DeviceUnavailable(_) => "No microphone was found on this device.",
            Self::InvalidState { .. } => "The recorder is busy.",
            Self::Encode(_) => "The voice note could not be saved.",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },
}

/// Draft validation. Callers treat this as a warning, not a failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Nothing to log: add a description, photo, or voice note")]
    EmptyDraft,
}

/// Fatal failure of a single submission
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Failed to log eco action: {0:#}")]
    Persistence(anyhow::Error),
}

/// Everything [`crate::composer::ActionComposer::submit`] can report
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl ComposeError {
    /// `EmptyDraft` is a nudge to the user, everything else is a real failure
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Draft(DraftError::EmptyDraft))
    }
}
