//! The owned brew session handle and its background timing loop.
//!
//! A [`BrewSession`] wraps a [`BrewEngine`] behind a single lock and drives
//! it with a chain of cancellable clock timers:
//!
//! - every wake polls the engine, then re-arms itself after
//!   `min(sleep_resolution, remaining)`, so deadlines are hit on time;
//! - a skip re-arms the timer for an immediate wake;
//! - each re-arm bumps a timer token, which cancels the previous wake;
//! - each `start` bumps the session generation, which drops every queued
//!   notification of the superseded session.
//!
//! Notifications are queued under the lock and delivered outside it, in
//! order, so observers may call back into the session.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use super::clock::Clock;
use super::engine::{BrewEngine, BrewSnapshot, BrewState};
use super::observer::SessionObserver;
use crate::error::Result;
use crate::events::BrewEvent;
use crate::profile::TeaProfile;

/// Identifies one `start` of a session handle. Increases monotonically.
pub type SessionId = u64;

struct Core {
    engine: BrewEngine,
    generation: SessionId,
    timer_token: u64,
    outbox: VecDeque<(SessionId, BrewEvent)>,
}

struct Shared {
    clock: Arc<dyn Clock>,
    core: Mutex<Core>,
    observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
    dispatch: Mutex<()>,
}

/// Handle to the single in-progress brew.
///
/// Owned by whatever controls the presentation layer. The timing loop only
/// keeps a weak reference, so dropping the handle stops it.
pub struct BrewSession {
    shared: Arc<Shared>,
}

impl BrewSession {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                clock,
                core: Mutex::new(Core {
                    engine: BrewEngine::new(),
                    generation: 0,
                    timer_token: 0,
                    outbox: VecDeque::new(),
                }),
                observers: RwLock::new(Vec::new()),
                dispatch: Mutex::new(()),
            }),
        }
    }

    /// Register an observer for all future notifications.
    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        self.shared.observers.write().push(observer);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> BrewState {
        self.shared.core.lock().engine.state()
    }

    /// Id of the latest `start`, or 0 if nothing was ever started.
    pub fn session_id(&self) -> SessionId {
        self.shared.core.lock().generation
    }

    pub fn remaining(&self) -> Duration {
        let now = self.shared.clock.now();
        self.shared.core.lock().engine.remaining(now)
    }

    pub fn snapshot(&self) -> BrewSnapshot {
        let now = self.shared.clock.now();
        let core = self.shared.core.lock();
        core.engine.snapshot(core.generation, now)
    }

    /// The brewed profile once the session reached `Finished`.
    pub fn finished_profile(&self) -> Option<TeaProfile> {
        self.shared.core.lock().engine.finished_profile().cloned()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start brewing `profile`, superseding any session in progress.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidProfile` if the schedule is malformed; the
    /// current session, if any, keeps running.
    pub fn start(&self, profile: TeaProfile) -> Result<SessionId> {
        profile.validate_schedule()?;
        let shared = &self.shared;
        let generation = {
            let mut core = shared.core.lock();
            let now = shared.clock.now();
            if core.engine.state() == BrewState::Brewing {
                info!(
                    previous = core.generation,
                    tea = %profile.name,
                    "superseding brew in progress"
                );
            }
            let name = profile.name.clone();
            let events = core.engine.start(profile, now)?;
            core.generation += 1;
            core.outbox.clear();
            let generation = core.generation;
            core.outbox.extend(events.into_iter().map(|e| (generation, e)));
            let first_wake = wake_delay(&core.engine, now, shared.clock.sleep_resolution());
            Shared::arm(shared, &mut core, first_wake);
            info!(session = generation, tea = %name, "brew started");
            generation
        };
        Shared::flush(shared);
        Ok(generation)
    }

    /// End the current pour early. Ignored unless brewing.
    pub fn skip(&self) -> bool {
        self.request_skip(None)
    }

    /// End pour `pour_index` early, but only if it is still the active pour.
    pub fn skip_pour(&self, pour_index: usize) -> bool {
        self.request_skip(Some(pour_index))
    }

    /// Cancel a brew in progress. Returns whether anything was cancelled.
    ///
    /// No further notifications of the cancelled session are delivered.
    pub fn abort(&self) -> bool {
        let mut core = self.shared.core.lock();
        if core.engine.state() != BrewState::Brewing {
            return false;
        }
        info!(session = core.generation, "brew aborted");
        Shared::clear(&mut core);
        true
    }

    /// Return to `Idle` from any state. Idempotent.
    pub fn reset(&self) {
        let mut core = self.shared.core.lock();
        if core.engine.state() == BrewState::Idle {
            return;
        }
        debug!(session = core.generation, "session reset");
        Shared::clear(&mut core);
    }

    fn request_skip(&self, expected_pour: Option<usize>) -> bool {
        let shared = &self.shared;
        let mut core = shared.core.lock();
        if !core.engine.request_skip(expected_pour) {
            return false;
        }
        debug!(pour = core.engine.pour_index(), "skip requested");
        Shared::arm(shared, &mut core, Duration::ZERO);
        true
    }
}

impl Drop for BrewSession {
    fn drop(&mut self) {
        Shared::clear(&mut self.shared.core.lock());
    }
}

impl Shared {
    /// Schedule the next poll, cancelling any wake already armed.
    fn arm(this: &Arc<Self>, core: &mut Core, delay: Duration) {
        core.timer_token += 1;
        let token = core.timer_token;
        let weak: Weak<Self> = Arc::downgrade(this);
        this.clock.after(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Shared::poll(&shared, token);
                }
            }),
        );
    }

    /// One iteration of the timing loop.
    fn poll(this: &Arc<Self>, token: u64) {
        {
            let mut core = this.core.lock();
            if core.timer_token != token || core.engine.state() != BrewState::Brewing {
                return;
            }
            let now = this.clock.now();
            let events = core.engine.poll(now);
            let generation = core.generation;
            core.outbox.extend(events.into_iter().map(|e| (generation, e)));
            if core.engine.state() == BrewState::Brewing {
                let delay = wake_delay(&core.engine, now, this.clock.sleep_resolution());
                Shared::arm(this, &mut core, delay);
            }
        }
        Shared::flush(this);
    }

    /// Invalidate pending wakes and notifications, then go idle.
    fn clear(core: &mut Core) {
        core.engine.reset();
        core.timer_token += 1;
        core.outbox.clear();
    }

    fn next_event(&self) -> Option<BrewEvent> {
        let mut core = self.core.lock();
        while let Some((generation, event)) = core.outbox.pop_front() {
            if generation == core.generation {
                return Some(event);
            }
        }
        None
    }

    /// Deliver queued events in order. Only one thread delivers at a time;
    /// a caller that finds delivery in progress leaves its events to it.
    fn flush(this: &Arc<Self>) {
        loop {
            let Some(guard) = this.dispatch.try_lock() else {
                return;
            };
            while let Some(event) = this.next_event() {
                let observers = this.observers.read().clone();
                for observer in observers {
                    let delivered = catch_unwind(AssertUnwindSafe(|| observer.on_event(&event)));
                    if delivered.is_err() {
                        error!(?event, "session observer panicked; continuing");
                    }
                }
            }
            drop(guard);
            if this.core.lock().outbox.is_empty() {
                return;
            }
        }
    }
}

fn wake_delay(engine: &BrewEngine, now: DateTime<Utc>, resolution: Duration) -> Duration {
    let remaining = engine.remaining(now);
    if remaining.is_zero() {
        resolution
    } else {
        remaining.min(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::VirtualClock;
    use chrono::TimeDelta;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<BrewEvent>>);

    impl SessionObserver for Recorder {
        fn on_event(&self, event: &BrewEvent) {
            if !event.is_tick() {
                self.0.lock().push(event.clone());
            }
        }
    }

    fn setup() -> (VirtualClock, BrewSession, Arc<Recorder>) {
        let clock = VirtualClock::new();
        let session = BrewSession::new(Arc::new(clock.clone()));
        let recorder = Arc::new(Recorder::default());
        session.subscribe(recorder.clone());
        (clock, session, recorder)
    }

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::default() + TimeDelta::seconds(secs)
    }

    #[test]
    fn start_notifies_first_pour_synchronously() {
        let (_clock, session, recorder) = setup();
        let id = session.start(TeaProfile::new("Assam", vec![30, 90])).unwrap();
        assert_eq!(id, 1);
        assert_eq!(session.state(), BrewState::Brewing);
        assert_eq!(
            *recorder.0.lock(),
            vec![BrewEvent::PourStarted {
                pour_index: 1,
                pour_count: 2,
                deadline: t(30)
            }]
        );
    }

    #[test]
    fn invalid_profile_leaves_running_session_alone() {
        let (_clock, session, _recorder) = setup();
        session.start(TeaProfile::new("Assam", vec![30])).unwrap();
        assert!(session.start(TeaProfile::new("Broken", vec![])).is_err());
        assert_eq!(session.session_id(), 1);
        assert_eq!(session.snapshot().tea_name.as_deref(), Some("Assam"));
    }

    #[test]
    fn remaining_follows_clock() {
        let (clock, session, _recorder) = setup();
        session.start(TeaProfile::new("Assam", vec![30])).unwrap();
        clock.advance(Duration::from_secs(12));
        assert_eq!(session.remaining(), Duration::from_secs(18));
    }

    #[test]
    fn abort_stops_notifications() {
        let (clock, session, recorder) = setup();
        session.start(TeaProfile::new("Assam", vec![30, 90])).unwrap();
        assert!(session.abort());
        assert!(!session.abort());
        clock.advance(Duration::from_secs(600));
        assert_eq!(recorder.0.lock().len(), 1);
        assert_eq!(session.state(), BrewState::Idle);
    }

    #[test]
    fn dropping_handle_stops_loop() {
        let (clock, session, recorder) = setup();
        session.start(TeaProfile::new("Assam", vec![30])).unwrap();
        drop(session);
        clock.advance(Duration::from_secs(60));
        assert_eq!(recorder.0.lock().len(), 1);
    }

    #[test]
    fn repeated_skips_do_not_multiply_timers() {
        let (clock, session, _recorder) = setup();
        session.start(TeaProfile::new("Assam", vec![30, 30, 30])).unwrap();
        for _ in 0..3 {
            assert!(session.skip());
            clock.run_due();
        }
        assert_eq!(session.state(), BrewState::Finished);
        // Stale wakes stay queued but are inert; none re-arm.
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn observer_may_reset_from_finished_callback() {
        struct ResetOnFinish {
            session: Mutex<Option<Weak<Shared>>>,
            finished: Mutex<usize>,
        }
        impl SessionObserver for ResetOnFinish {
            fn on_session_finished(&self, _profile: &TeaProfile) {
                *self.finished.lock() += 1;
                if let Some(shared) = self.session.lock().as_ref().and_then(Weak::upgrade) {
                    Shared::clear(&mut shared.core.lock());
                }
            }
        }

        let (clock, session, _recorder) = setup();
        let observer = Arc::new(ResetOnFinish {
            session: Mutex::new(Some(Arc::downgrade(&session.shared))),
            finished: Mutex::new(0),
        });
        session.subscribe(observer.clone());
        session.start(TeaProfile::new("Assam", vec![5])).unwrap();
        clock.advance(Duration::from_secs(5));
        assert_eq!(*observer.finished.lock(), 1);
        assert_eq!(session.state(), BrewState::Idle);
    }

    #[test]
    fn panicking_observer_does_not_stall_loop() {
        struct Boom;
        impl SessionObserver for Boom {
            fn on_pour_completed(&self, _pour_index: usize, _profile: &TeaProfile) {
                panic!("observer failure");
            }
        }

        let (clock, session, recorder) = setup();
        session.subscribe(Arc::new(Boom));
        session.start(TeaProfile::new("Assam", vec![5, 5])).unwrap();
        clock.advance(Duration::from_secs(10));
        assert_eq!(session.state(), BrewState::Finished);
        assert!(matches!(
            recorder.0.lock().last(),
            Some(BrewEvent::SessionFinished { .. })
        ));
    }
}
