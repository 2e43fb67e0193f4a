//! File-backed stand-ins for the microphone and speaker.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use parlance_core::device::{AudioPlayer, AudioRecorder};
use parlance_core::error::DeviceError;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Takes {
    sources: VecDeque<PathBuf>,
    target: Option<PathBuf>,
}

/// A recorder that "captures" by copying the next pre-recorded file into
/// the path it was started with. Once the files run out, stopping yields
/// no artifact.
#[derive(Debug)]
pub struct FileRecorder {
    takes: Mutex<Takes>,
}

impl FileRecorder {
    /// Creates a recorder playing back `sources` in order.
    #[must_use]
    pub fn new(sources: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            takes: Mutex::new(Takes {
                sources: sources.into_iter().collect(),
                target: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Takes> {
        self.takes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AudioRecorder for FileRecorder {
    async fn start(&self, path: &Path) -> Result<(), DeviceError> {
        self.lock().target = Some(path.to_path_buf());
        Ok(())
    }

    async fn stop(&self) -> Result<Option<PathBuf>, DeviceError> {
        let (source, target) = {
            let mut takes = self.lock();
            let Some(target) = takes.target.take() else {
                return Ok(None);
            };
            let Some(source) = takes.sources.pop_front() else {
                return Ok(None);
            };
            (source, target)
        };
        tokio::fs::copy(&source, &target)
            .await
            .map_err(|e| DeviceError::Failure(format!("{}: {e}", source.display())))?;
        debug!(source = %source.display(), target = %target.display(), "recording captured");
        Ok(Some(target))
    }

    async fn cancel(&self) {
        self.lock().target = None;
    }
}

/// A player that only logs. Probes never know the duration, so reveals run
/// at the fallback rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPlayer;

#[async_trait]
impl AudioPlayer for LoggingPlayer {
    async fn probe_duration(&self, _artifact: &Path) -> Result<Option<Duration>, DeviceError> {
        Ok(None)
    }

    fn play(&self, artifact: &Path) -> Result<(), DeviceError> {
        info!(audio = %artifact.display(), "playing");
        Ok(())
    }

    fn stop(&self) {
        debug!("playback stopped");
    }
}
