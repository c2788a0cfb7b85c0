//! Push interface for brew session progress.

use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info};

use crate::events::BrewEvent;
use crate::profile::TeaProfile;

/// Receives brew session notifications.
///
/// Callbacks run on whichever thread advanced the session (the timing loop
/// for anything after `start`). Implementations that touch UI state should
/// forward the event to the UI thread, e.g. through [`ChannelObserver`].
pub trait SessionObserver: Send + Sync {
    fn on_pour_started(&self, _pour_index: usize, _deadline: DateTime<Utc>) {}

    /// Reminder trigger for a pour. The session does not wait for it.
    fn on_pour_completed(&self, _pour_index: usize, _profile: &TeaProfile) {}

    fn on_session_finished(&self, _profile: &TeaProfile) {}

    /// Countdown update, fired on every poll that does not transition.
    fn on_tick(&self, _remaining: Duration) {}

    /// Entry point used by the session; routes to the callbacks above.
    fn on_event(&self, event: &BrewEvent) {
        event.dispatch(self);
    }
}

/// Forwards every event into a channel consumed by the interactive context.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<BrewEvent>,
    include_ticks: bool,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its unbounded queue.
    pub fn new() -> (Self, Receiver<BrewEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            Self {
                tx,
                include_ticks: true,
            },
            rx,
        )
    }

    pub fn from_sender(tx: Sender<BrewEvent>) -> Self {
        Self {
            tx,
            include_ticks: true,
        }
    }

    /// Drop `Tick` events instead of queueing them.
    pub fn without_ticks(mut self) -> Self {
        self.include_ticks = false;
        self
    }
}

impl SessionObserver for ChannelObserver {
    fn on_event(&self, event: &BrewEvent) {
        if event.is_tick() && !self.include_ticks {
            return;
        }
        // A closed receiver means the UI went away; nothing left to tell.
        let _ = self.tx.send(event.clone());
    }
}

/// Writes session transitions to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_pour_started(&self, pour_index: usize, deadline: DateTime<Utc>) {
        info!(pour = pour_index, %deadline, "pour started");
    }

    fn on_pour_completed(&self, pour_index: usize, profile: &TeaProfile) {
        info!(pour = pour_index, tea = %profile.name, "pour ready");
    }

    fn on_session_finished(&self, profile: &TeaProfile) {
        info!(tea = %profile.name, "brew finished");
    }

    fn on_tick(&self, remaining: Duration) {
        debug!(remaining_ms = remaining.as_millis() as u64, "tick");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_observer_forwards_events() {
        let (observer, rx) = ChannelObserver::new();
        let event = BrewEvent::Tick {
            pour_index: 1,
            remaining_ms: 500,
        };
        observer.on_event(&event);
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn channel_observer_can_drop_ticks() {
        let (observer, rx) = ChannelObserver::new();
        let observer = observer.without_ticks();
        observer.on_event(&BrewEvent::Tick {
            pour_index: 1,
            remaining_ms: 500,
        });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn default_on_event_routes_to_callbacks() {
        use parking_lot::Mutex;

        #[derive(Default)]
        struct Finished(Mutex<Vec<String>>);
        impl SessionObserver for Finished {
            fn on_session_finished(&self, profile: &TeaProfile) {
                self.0.lock().push(profile.name.clone());
            }
        }

        let observer = Finished::default();
        observer.on_event(&BrewEvent::SessionFinished {
            profile: TeaProfile::new("Keemun", vec![60]),
            at: Utc::now(),
        });
        assert_eq!(*observer.0.lock(), vec!["Keemun".to_string()]);
    }
}
