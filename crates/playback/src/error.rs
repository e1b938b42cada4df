// Error types for the playback engine
use skip_times::SkipTimesError;
use thiserror::Error;

/// Errors raised while driving a playback session.
///
/// Apart from [`PlaybackError::SessionClosed`], none of these stop a session:
/// the session logs them and continues with reduced features.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Network failure during {operation}: {reason}")]
    TransientNetwork {
        operation: &'static str,
        reason: String,
    },

    #[error("Malformed manifest: {reason}")]
    MalformedManifest { reason: String },

    #[error("Media clock unavailable: {reason}")]
    ClockUnavailable { reason: String },

    #[error("Skip vote submission failed: {source}")]
    VoteSubmission {
        #[from]
        source: SkipTimesError,
    },

    #[error("Invalid media source '{input}': {reason}")]
    InvalidSource { input: String, reason: String },

    #[error("Playback session closed")]
    SessionClosed,
}

impl PlaybackError {
    pub fn transient(operation: &'static str, reason: impl Into<String>) -> Self {
        PlaybackError::TransientNetwork {
            operation,
            reason: reason.into(),
        }
    }

    pub fn malformed_manifest(reason: impl Into<String>) -> Self {
        PlaybackError::MalformedManifest {
            reason: reason.into(),
        }
    }

    pub fn clock_unavailable(reason: impl Into<String>) -> Self {
        PlaybackError::ClockUnavailable {
            reason: reason.into(),
        }
    }

    pub fn invalid_source(input: impl Into<String>, reason: impl Into<String>) -> Self {
        PlaybackError::InvalidSource {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// HTTP errors map to transient network failures tagged with the operation.
    pub fn from_http(operation: &'static str, err: reqwest::Error) -> Self {
        Self::transient(operation, err.to_string())
    }

    /// Whether the failure only degrades features for the current media.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::TransientNetwork { .. } | PlaybackError::ClockUnavailable { .. } => true,
            PlaybackError::VoteSubmission { source } => source.is_transient(),
            _ => false,
        }
    }
}
