//! Turn-level error taxonomy.

use thiserror::Error;

/// Message shown for failures whose details are not meant for the player.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors raised by audio devices (microphone and speaker).
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Capture permission was refused by the platform or the player.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The device failed for another reason.
    #[error("audio device failure: {0}")]
    Failure(String),
}

/// Everything that can go wrong while taking a conversation turn.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Capture permission refused. Silent; the conversation stays idle.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// Network or connection failure talking to the dialogue service.
    #[error("transport error: {0}")]
    Transport(String),

    /// A successful response without usable turn metadata.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The dialogue service answered with a non-success status.
    #[error("service error ({status}): {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Player-facing message extracted from the error body.
        message: String,
    },

    /// Probing the reply audio failed. Never surfaced to the player.
    #[error("audio probe failed: {0}")]
    AudioProbe(String),

    /// The operation is not valid in the conversation's current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// Name of the state the conversation was in.
        state: &'static str,
    },

    /// Capture stopped without producing an audio artifact.
    #[error("recording produced no audio")]
    EmptyRecording,

    /// The recorder failed for a reason other than permission.
    #[error("capture failed: {0}")]
    Capture(String),

    /// Reading or writing scratch audio failed.
    #[error("scratch storage error: {0}")]
    Storage(String),

    /// The requested turn has no audio to replay.
    #[error("nothing to replay")]
    NothingToReplay,

    /// The conversation has been torn down.
    #[error("conversation closed")]
    Closed,
}

impl TurnError {
    /// Returns the text the player should see, or `None` for failures that
    /// are handled silently.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::PermissionDenied
            | Self::AudioProbe(_)
            | Self::InvalidState { .. }
            | Self::NothingToReplay
            | Self::Closed => None,
            Self::Service { message, .. } => Some(message.clone()),
            Self::Transport(_)
            | Self::Protocol(_)
            | Self::EmptyRecording
            | Self::Capture(_)
            | Self::Storage(_) => Some(GENERIC_FAILURE_MESSAGE.to_owned()),
        }
    }
}

impl From<DeviceError> for TurnError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::PermissionDenied => Self::PermissionDenied,
            DeviceError::Failure(reason) => Self::Capture(reason),
        }
    }
}
