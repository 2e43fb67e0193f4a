//! Test clocks — deterministic `Clock` and `Scheduler` implementations.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parlance_core::clock::{Clock, Scheduler, TickCallback, TickFlow};
use tokio_util::sync::CancellationToken;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

struct Timer {
    id: u64,
    interval: Duration,
    due: Duration,
    token: CancellationToken,
    callback: Option<TickCallback>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

/// A fake-time scheduler. Nothing fires until `advance` is called; timers
/// then fire in due order, each callback running without internal locks
/// held so it may schedule or cancel timers itself.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    /// Creates a scheduler at fake time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed fake time.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of timers neither stopped nor cancelled.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn active_timers(&self) -> usize {
        self.lock()
            .timers
            .iter()
            .filter(|t| !t.token.is_cancelled())
            .count()
    }

    /// Moves fake time forward by `by`, firing every tick that falls due.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now + by;
        loop {
            let next = {
                let mut state = self.lock();
                state.timers.retain(|t| !t.token.is_cancelled());
                let due = state
                    .timers
                    .iter_mut()
                    .filter(|t| t.due <= target && t.callback.is_some())
                    .min_by_key(|t| (t.due, t.id));
                match due {
                    Some(timer) => {
                        let fired = (timer.id, timer.due, timer.callback.take());
                        state.now = fired.1;
                        Some(fired)
                    }
                    None => None,
                }
            };
            let Some((id, _, Some(mut callback))) = next else {
                break;
            };

            let flow = callback();

            let mut state = self.lock();
            if let Some(index) = state.timers.iter().position(|t| t.id == id) {
                let timer = &mut state.timers[index];
                if flow == TickFlow::Stop || timer.token.is_cancelled() {
                    timer.token.cancel();
                    state.timers.remove(index);
                } else {
                    timer.due += timer.interval;
                    timer.callback = Some(callback);
                }
            }
        }
        self.lock().now = target;
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_periodic(&self, interval: Duration, callback: TickCallback) -> CancellationToken {
        let token = CancellationToken::new();
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        let due = state.now + interval.max(Duration::from_nanos(1));
        state.timers.push(Timer {
            id,
            interval: interval.max(Duration::from_nanos(1)),
            due,
            token: token.clone(),
            callback: Some(callback),
        });
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>, stop_after: usize) -> TickCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 >= stop_after {
                TickFlow::Stop
            } else {
                TickFlow::Continue
            }
        })
    }

    #[test]
    fn test_ticks_fire_only_when_time_advances() {
        // Arrange
        let scheduler = ManualScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let _token = scheduler.schedule_periodic(Duration::from_millis(100), counting(&ticks, 100));

        // Act
        scheduler.advance(Duration::from_millis(99));
        let before = ticks.load(Ordering::SeqCst);
        scheduler.advance(Duration::from_millis(251));

        // Assert
        assert_eq!(before, 0);
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.now(), Duration::from_millis(350));
    }

    #[test]
    fn test_stop_removes_timer() {
        let scheduler = ManualScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let _token = scheduler.schedule_periodic(Duration::from_millis(10), counting(&ticks, 2));

        scheduler.advance(Duration::from_secs(1));

        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.active_timers(), 0);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let scheduler = ManualScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let token = scheduler.schedule_periodic(Duration::from_millis(10), counting(&ticks, 100));

        token.cancel();
        scheduler.advance(Duration::from_secs(1));

        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
