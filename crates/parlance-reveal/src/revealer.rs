//! Timer-driven reveal tied to reply audio.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use parlance_core::clock::{Scheduler, TickFlow};
use parlance_core::device::AudioPlayer;
use parlance_core::error::TurnError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::rate::{RevealConfig, RevealRate};
use crate::typewriter::{Step, Typewriter};

/// Receives the progress of one reveal.
///
/// Callbacks run on the scheduler's tick; they must not block.
pub trait RevealSink: Send + Sync {
    /// A further prefix of the text is visible.
    fn on_progress(&self, revealed: &str);

    /// The whole text is visible. Called at most once per reveal and never
    /// after the reveal was cancelled.
    fn on_complete(&self, text: &str);
}

/// Text to reveal and the audio it accompanies.
#[derive(Debug, Clone)]
pub struct RevealRequest {
    /// Full text to disclose.
    pub text: String,
    /// Spoken version of the text.
    pub audio: Option<PathBuf>,
}

/// How a reveal got under way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStart {
    /// Ticks are scheduled at the given rate.
    Scheduled(RevealRate),
    /// Empty text; completion was reported synchronously.
    Completed,
    /// Cancelled before any tick was scheduled.
    Cancelled,
}

/// Cancellation handle for one reveal.
///
/// Cancelling stops the tick timer immediately, including when it is
/// cancelled while the audio probe is still outstanding.
#[derive(Debug, Clone)]
pub struct RevealHandle {
    token: CancellationToken,
    timer: Arc<Mutex<Option<CancellationToken>>>,
}

impl RevealHandle {
    /// Creates a live handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            timer: Arc::new(Mutex::new(None)),
        }
    }

    /// Abandons the reveal. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
        let timer = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            timer.cancel();
        }
    }

    /// Returns `true` once `cancel` has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn attach_timer(&self, timer: CancellationToken) {
        *self.timer.lock().unwrap_or_else(PoisonError::into_inner) = Some(timer.clone());
        if self.token.is_cancelled() {
            timer.cancel();
        }
    }
}

impl Default for RevealHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives reveals using a scheduler for ticks and a player for audio.
#[derive(Clone)]
pub struct Revealer {
    scheduler: Arc<dyn Scheduler>,
    player: Arc<dyn AudioPlayer>,
    config: RevealConfig,
}

impl Revealer {
    /// Creates a revealer.
    #[must_use]
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        player: Arc<dyn AudioPlayer>,
        config: RevealConfig,
    ) -> Self {
        Self {
            scheduler,
            player,
            config,
        }
    }

    /// Probes the audio, starts playback and schedules one tick per
    /// character. `sink` is told about every revealed prefix and, on the
    /// last character, about completion.
    pub async fn start(
        &self,
        handle: &RevealHandle,
        request: RevealRequest,
        sink: Arc<dyn RevealSink>,
    ) -> RevealStart {
        let mut typewriter = Typewriter::new(request.text);
        let char_count = typewriter.char_count();

        if char_count == 0 {
            if handle.is_cancelled() {
                return RevealStart::Cancelled;
            }
            if !self.play(handle, request.audio.as_ref()) {
                return RevealStart::Cancelled;
            }
            sink.on_complete("");
            return RevealStart::Completed;
        }

        let duration = match &request.audio {
            Some(audio) => self.probe(audio).await,
            None => None,
        };
        if handle.is_cancelled() {
            debug!("reveal cancelled during audio probe");
            return RevealStart::Cancelled;
        }

        let rate = RevealRate::compute(&self.config, char_count, duration);
        debug!(
            chars = char_count,
            per_char_ms = u64::try_from(rate.per_char.as_millis()).unwrap_or(u64::MAX),
            source = ?rate.source,
            "starting reveal"
        );
        if !self.play(handle, request.audio.as_ref()) {
            debug!("reveal cancelled as playback started");
            return RevealStart::Cancelled;
        }

        let token = handle.token.clone();
        let timer = self.scheduler.schedule_periodic(
            rate.per_char,
            Box::new(move || {
                if token.is_cancelled() {
                    return TickFlow::Stop;
                }
                match typewriter.advance() {
                    Step::Partial(prefix) => {
                        sink.on_progress(prefix);
                        TickFlow::Continue
                    }
                    Step::Complete(text) => {
                        sink.on_complete(text);
                        TickFlow::Stop
                    }
                    Step::Exhausted => TickFlow::Stop,
                }
            }),
        );
        handle.attach_timer(timer);
        RevealStart::Scheduled(rate)
    }

    async fn probe(&self, audio: &std::path::Path) -> Option<Duration> {
        match self.player.probe_duration(audio).await {
            Ok(Some(duration)) if !duration.is_zero() => Some(duration),
            Ok(_) => None,
            Err(e) => {
                let err = TurnError::AudioProbe(e.to_string());
                warn!(error = %err, "falling back to fixed reveal rate");
                None
            }
        }
    }

    /// One output channel: anything already playing is stopped first.
    /// Returns `false`, with playback stopped again, if `handle` was
    /// cancelled while playback was starting.
    fn play(&self, handle: &RevealHandle, audio: Option<&PathBuf>) -> bool {
        self.player.stop();
        if let Some(audio) = audio {
            if let Err(e) = self.player.play(audio) {
                warn!(error = %e, audio = %audio.display(), "reply playback failed");
            }
        }
        if handle.is_cancelled() {
            self.player.stop();
            return false;
        }
        true
    }
}
