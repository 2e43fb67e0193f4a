//! Test devices — recording `AudioRecorder` and `AudioPlayer` doubles.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use parlance_core::device::{AudioPlayer, AudioRecorder};
use parlance_core::error::DeviceError;

/// A call observed by `FakeRecorder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderCall {
    /// `start(path)`.
    Start(PathBuf),
    /// `stop()`.
    Stop,
    /// `cancel()`.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecorderMode {
    Capture,
    Deny,
    Silent,
}

/// A recorder that records calls and hands back the path it was started
/// with. No audio is written.
#[derive(Debug)]
pub struct FakeRecorder {
    mode: RecorderMode,
    current: Mutex<Option<PathBuf>>,
    calls: Mutex<Vec<RecorderCall>>,
}

impl FakeRecorder {
    fn with_mode(mode: RecorderMode) -> Self {
        Self {
            mode,
            current: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A recorder that grants permission and produces an artifact.
    #[must_use]
    pub fn new() -> Self {
        Self::with_mode(RecorderMode::Capture)
    }

    /// A recorder whose permission is always refused.
    #[must_use]
    pub fn denying() -> Self {
        Self::with_mode(RecorderMode::Deny)
    }

    /// A recorder that starts but never produces an artifact.
    #[must_use]
    pub fn silent() -> Self {
        Self::with_mode(RecorderMode::Silent)
    }

    /// Returns a snapshot of the calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<RecorderCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for FakeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioRecorder for FakeRecorder {
    async fn start(&self, path: &Path) -> Result<(), DeviceError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecorderCall::Start(path.to_path_buf()));
        if self.mode == RecorderMode::Deny {
            return Err(DeviceError::PermissionDenied);
        }
        *self.current.lock().unwrap() = Some(path.to_path_buf());
        Ok(())
    }

    async fn stop(&self) -> Result<Option<PathBuf>, DeviceError> {
        self.calls.lock().unwrap().push(RecorderCall::Stop);
        let path = self.current.lock().unwrap().take();
        Ok(path.filter(|_| self.mode == RecorderMode::Capture))
    }

    async fn cancel(&self) {
        self.calls.lock().unwrap().push(RecorderCall::Cancel);
        self.current.lock().unwrap().take();
    }
}

/// A call observed by `FakePlayer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCall {
    /// `probe_duration(path)`.
    Probe(PathBuf),
    /// `play(path)`.
    Play(PathBuf),
    /// `stop()`.
    Stop,
}

#[derive(Debug, Clone)]
enum ProbeResult {
    Duration(Duration),
    Unknown,
    Fails,
}

/// A player that records calls and answers probes from a fixed script.
#[derive(Debug)]
pub struct FakePlayer {
    probe: ProbeResult,
    calls: Mutex<Vec<PlayerCall>>,
}

impl FakePlayer {
    fn with_probe(probe: ProbeResult) -> Self {
        Self {
            probe,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every probe reports `duration`.
    #[must_use]
    pub fn with_duration(duration: Duration) -> Self {
        Self::with_probe(ProbeResult::Duration(duration))
    }

    /// Every probe reports an unknown duration.
    #[must_use]
    pub fn without_duration() -> Self {
        Self::with_probe(ProbeResult::Unknown)
    }

    /// Every probe fails to decode the artifact.
    #[must_use]
    pub fn failing_probe() -> Self {
        Self::with_probe(ProbeResult::Fails)
    }

    /// Returns a snapshot of the calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the artifacts passed to `play`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn played(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlayerCall::Play(path) => Some(path),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    async fn probe_duration(&self, artifact: &Path) -> Result<Option<Duration>, DeviceError> {
        self.calls
            .lock()
            .unwrap()
            .push(PlayerCall::Probe(artifact.to_path_buf()));
        match self.probe {
            ProbeResult::Duration(duration) => Ok(Some(duration)),
            ProbeResult::Unknown => Ok(None),
            ProbeResult::Fails => Err(DeviceError::Failure("unsupported codec".into())),
        }
    }

    fn play(&self, artifact: &Path) -> Result<(), DeviceError> {
        self.calls
            .lock()
            .unwrap()
            .push(PlayerCall::Play(artifact.to_path_buf()));
        Ok(())
    }

    fn stop(&self) {
        self.calls.lock().unwrap().push(PlayerCall::Stop);
    }
}
