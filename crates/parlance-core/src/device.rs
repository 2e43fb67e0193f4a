//! Audio device ports.
//!
//! The conversation core never touches codecs or hardware directly; the
//! host supplies these implementations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DeviceError;

/// Microphone capture.
#[async_trait]
pub trait AudioRecorder: Send + Sync {
    /// Starts recording into `path`.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::PermissionDenied` when capture permission is
    /// refused.
    async fn start(&self, path: &Path) -> Result<(), DeviceError>;

    /// Stops recording and returns the artifact, or `None` when nothing was
    /// captured.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Failure` when the recorder cannot be stopped.
    async fn stop(&self) -> Result<Option<PathBuf>, DeviceError>;

    /// Abandons an in-progress recording without producing an artifact.
    async fn cancel(&self);
}

/// Speaker output, one channel per conversation view.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Loads `artifact` without playing it and returns its duration.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Failure` when the artifact cannot be decoded.
    async fn probe_duration(&self, artifact: &Path) -> Result<Option<Duration>, DeviceError>;

    /// Starts playing `artifact`, returning once playback has begun.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Failure` when playback cannot start.
    fn play(&self, artifact: &Path) -> Result<(), DeviceError>;

    /// Stops whatever is playing. A no-op when idle.
    fn stop(&self);
}
