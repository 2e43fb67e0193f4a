//! Clock and timer abstractions for determinism.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Abstraction over system time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Whether a periodic callback wants to keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    /// Fire again after another interval.
    Continue,
    /// Stop the timer; the callback is never invoked again.
    Stop,
}

/// Callback invoked on every tick of a periodic timer.
pub type TickCallback = Box<dyn FnMut() -> TickFlow + Send>;

/// Abstraction over periodic timers.
///
/// The first tick fires one `interval` after scheduling. A zero `interval`
/// is raised to the shortest interval the implementation supports.
/// Cancelling the returned token stops the timer before its next tick.
pub trait Scheduler: Send + Sync {
    /// Schedules `callback` every `interval` until it returns
    /// `TickFlow::Stop` or the token is cancelled.
    fn schedule_periodic(&self, interval: Duration, callback: TickCallback) -> CancellationToken;
}

/// Shortest period `TokioScheduler` will arm; tokio rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Production scheduler backed by `tokio::time::interval`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler spawning its timers on `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a scheduler bound to the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_periodic(&self, interval: Duration, mut callback: TickCallback) -> CancellationToken {
        let interval = interval.max(MIN_PERIOD);
        let token = CancellationToken::new();
        let cancelled = token.clone();
        self.handle.spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        if cancelled.is_cancelled() || callback() == TickFlow::Stop {
                            break;
                        }
                    }
                }
            }
        });
        token
    }
}
