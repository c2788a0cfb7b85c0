//! Time source and timer primitive used by the brew session.
//!
//! Production code runs on [`SystemClock`], which arms `tokio` timers.
//! Tests use [`VirtualClock`], which only moves when told to and runs due
//! timers synchronously on the caller's thread.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::error::{CoreError, Result};

/// Polling granularity used when nothing overrides it.
pub const DEFAULT_SLEEP_RESOLUTION: Duration = Duration::from_millis(100);

/// Upper bound on the polling granularity; skips must be honoured quickly.
pub const MAX_SLEEP_RESOLUTION: Duration = Duration::from_millis(100);

/// Lower bound on the polling granularity.
pub const MIN_SLEEP_RESOLUTION: Duration = Duration::from_millis(10);

/// A unit of work scheduled with [`Clock::after`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Run `task` once at least `delay` has elapsed. It may run later,
    /// never earlier.
    fn after(&self, delay: Duration, task: Task);

    fn sleep_resolution(&self) -> Duration {
        DEFAULT_SLEEP_RESOLUTION
    }
}

/// Clamp a configured resolution into the supported range.
pub fn clamp_resolution(resolution: Duration) -> Duration {
    resolution.clamp(MIN_SLEEP_RESOLUTION, MAX_SLEEP_RESOLUTION)
}

pub(crate) fn to_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or_else(|_| TimeDelta::days(365 * 100))
}

// ── System clock ─────────────────────────────────────────────────────

/// Wall clock backed by `tokio` timers.
#[derive(Debug, Clone)]
pub struct SystemClock {
    handle: Handle,
    resolution: Duration,
}

impl SystemClock {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            resolution: DEFAULT_SLEEP_RESOLUTION,
        }
    }

    /// Bind to the runtime of the calling context.
    ///
    /// # Errors
    /// Returns `CoreError::Runtime` when called outside a `tokio` runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| CoreError::Runtime(e.to_string()))
    }

    pub fn with_resolution(mut self, resolution: Duration) -> Self {
        self.resolution = clamp_resolution(resolution);
        self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn after(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }

    fn sleep_resolution(&self) -> Duration {
        self.resolution
    }
}

// ── Virtual clock ────────────────────────────────────────────────────

struct Pending {
    due: DateTime<Utc>,
    seq: u64,
    task: Task,
}

struct VirtualState {
    now: DateTime<Utc>,
    next_seq: u64,
    pending: Vec<Pending>,
}

/// Deterministic clock for tests: time only moves on `advance`.
///
/// Cloning shares the same timeline.
#[derive(Clone)]
pub struct VirtualClock {
    inner: Arc<Mutex<VirtualState>>,
    resolution: Duration,
}

impl VirtualClock {
    /// A clock starting at the Unix epoch.
    pub fn new() -> Self {
        Self::starting_at(DateTime::<Utc>::default())
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VirtualState {
                now: start,
                next_seq: 0,
                pending: Vec::new(),
            })),
            resolution: DEFAULT_SLEEP_RESOLUTION,
        }
    }

    pub fn with_resolution(mut self, resolution: Duration) -> Self {
        self.resolution = clamp_resolution(resolution);
        self
    }

    /// Move time forward by `delta`, running every timer that falls due.
    pub fn advance(&self, delta: Duration) {
        let target = self.inner.lock().now + to_delta(delta);
        self.advance_to(target);
    }

    /// Move time forward to `target` (never backwards), running due timers
    /// in deadline order. While a timer runs, `now()` reports its deadline.
    pub fn advance_to(&self, target: DateTime<Utc>) {
        while let Some(task) = self.pop_due(target) {
            task();
        }
        let mut state = self.inner.lock();
        if target > state.now {
            state.now = target;
        }
    }

    /// Run timers that are already due without moving time.
    pub fn run_due(&self) {
        let now = self.inner.lock().now;
        self.advance_to(now);
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    fn pop_due(&self, target: DateTime<Utc>) -> Option<Task> {
        let mut state = self.inner.lock();
        let idx = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;
        let entry = state.pending.swap_remove(idx);
        if entry.due > state.now {
            state.now = entry.due;
        }
        Some(entry.task)
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        self.inner.lock().now
    }

    fn after(&self, delay: Duration, task: Task) {
        let mut state = self.inner.lock();
        let due = state.now + to_delta(delay);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.push(Pending { due, seq, task });
    }

    fn sleep_resolution(&self) -> Duration {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn virtual_timers_fire_in_deadline_order() {
        let clock = VirtualClock::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for (label, secs) in [("b", 20), ("a", 10), ("c", 20)] {
            let log = log.clone();
            let c = clock.clone();
            clock.after(
                Duration::from_secs(secs),
                Box::new(move || log.lock().push((label, c.now()))),
            );
        }

        clock.advance(Duration::from_secs(15));
        assert_eq!(log.lock().len(), 1);
        clock.advance(Duration::from_secs(15));

        let epoch = DateTime::<Utc>::default();
        let fired = log.lock().clone();
        assert_eq!(
            fired,
            vec![
                ("a", epoch + TimeDelta::seconds(10)),
                ("b", epoch + TimeDelta::seconds(20)),
                ("c", epoch + TimeDelta::seconds(20)),
            ]
        );
        assert_eq!(clock.now(), epoch + TimeDelta::seconds(30));
    }

    #[test]
    fn timers_scheduled_while_advancing_can_fire_in_same_advance() {
        let clock = VirtualClock::new();
        let hits = Arc::new(AtomicUsize::new(0));

        fn rearm(clock: VirtualClock, hits: Arc<AtomicUsize>) {
            let c = clock.clone();
            clock.after(
                Duration::from_secs(1),
                Box::new(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                    rearm(c, hits);
                }),
            );
        }
        rearm(clock.clone(), hits.clone());

        clock.advance(Duration::from_secs(5));
        assert_eq!(hits.load(Ordering::SeqCst), 5);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn zero_delay_runs_on_run_due() {
        let clock = VirtualClock::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        clock.after(Duration::ZERO, Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        clock.run_due();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolution_is_clamped() {
        let clock = VirtualClock::new().with_resolution(Duration::from_secs(2));
        assert_eq!(clock.sleep_resolution(), MAX_SLEEP_RESOLUTION);
        let clock = VirtualClock::new().with_resolution(Duration::from_millis(1));
        assert_eq!(clock.sleep_resolution(), MIN_SLEEP_RESOLUTION);
    }

    #[tokio::test]
    async fn system_clock_runs_task_after_delay() {
        let clock = SystemClock::current().unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let start = std::time::Instant::now();
        clock.after(
            Duration::from_millis(20),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(2)))
            .await
            .unwrap()
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
