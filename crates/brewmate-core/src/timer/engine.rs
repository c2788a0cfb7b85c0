//! Brew engine implementation.
//!
//! The brew engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller passes the current time to every command
//! and is responsible for calling `poll()` periodically.
//! [`BrewSession`](super::BrewSession) is that caller in production.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Brewing -> (Brewing)* -> Finished -> Idle
//!           \______ reset / superseded ______/
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BrewEngine::new();
//! engine.start(profile, now)?;
//! // In a loop:
//! let events = engine.poll(clock.now());
//! ```

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ProfileError;
use crate::events::BrewEvent;
use crate::profile::TeaProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrewState {
    Idle,
    Brewing,
    Finished,
}

/// Read-only view of the engine at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrewSnapshot {
    pub session_id: u64,
    pub state: BrewState,
    pub tea_name: Option<String>,
    /// 1-based; 0 while idle.
    pub pour_index: usize,
    pub pour_count: usize,
    pub pour_deadline: Option<DateTime<Utc>>,
    pub remaining_ms: u64,
    pub skip_requested: bool,
}

/// Core brew engine.
///
/// Operates on caller-supplied timestamps -- no internal thread, no clock.
#[derive(Debug, Clone)]
pub struct BrewEngine {
    state: BrewState,
    profile: Option<TeaProfile>,
    pour_index: usize,
    pour_deadline: Option<DateTime<Utc>>,
    skip_requested: bool,
}

impl BrewEngine {
    pub fn new() -> Self {
        Self {
            state: BrewState::Idle,
            profile: None,
            pour_index: 0,
            pour_deadline: None,
            skip_requested: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> BrewState {
        self.state
    }

    pub fn profile(&self) -> Option<&TeaProfile> {
        self.profile.as_ref()
    }

    pub fn pour_index(&self) -> usize {
        self.pour_index
    }

    pub fn pour_count(&self) -> usize {
        self.profile
            .as_ref()
            .map(|p| p.pour_count as usize)
            .unwrap_or(0)
    }

    pub fn pour_deadline(&self) -> Option<DateTime<Utc>> {
        self.pour_deadline
    }

    pub fn skip_requested(&self) -> bool {
        self.skip_requested
    }

    /// `max(0, deadline - now)`; zero when nothing is brewing.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        match (self.state, self.pour_deadline) {
            (BrewState::Brewing, Some(deadline)) => {
                (deadline - now).to_std().unwrap_or(Duration::ZERO)
            }
            _ => Duration::ZERO,
        }
    }

    /// The profile of a completed brew, ready for evaluation capture.
    pub fn finished_profile(&self) -> Option<&TeaProfile> {
        match self.state {
            BrewState::Finished => self.profile.as_ref(),
            _ => None,
        }
    }

    pub fn snapshot(&self, session_id: u64, now: DateTime<Utc>) -> BrewSnapshot {
        BrewSnapshot {
            session_id,
            state: self.state,
            tea_name: self.profile.as_ref().map(|p| p.name.clone()),
            pour_index: self.pour_index,
            pour_count: self.pour_count(),
            pour_deadline: self.pour_deadline,
            remaining_ms: self.remaining(now).as_millis() as u64,
            skip_requested: self.skip_requested,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin brewing `profile`, replacing whatever the engine held.
    ///
    /// Nothing changes when the schedule is invalid.
    pub fn start(
        &mut self,
        profile: TeaProfile,
        now: DateTime<Utc>,
    ) -> Result<Vec<BrewEvent>, ProfileError> {
        profile.validate_schedule()?;
        let first = profile.interval(1).ok_or(ProfileError::NoPours)?;
        let deadline = now + seconds(first);
        let pour_count = profile.pour_count as usize;

        self.state = BrewState::Brewing;
        self.profile = Some(profile);
        self.pour_index = 1;
        self.pour_deadline = Some(deadline);
        self.skip_requested = false;

        Ok(vec![BrewEvent::PourStarted {
            pour_index: 1,
            pour_count,
            deadline,
        }])
    }

    /// Ask the loop to end the current pour early.
    ///
    /// With `expected_pour` set, the request only applies while that pour
    /// is still the active one. Returns whether the flag was raised.
    pub fn request_skip(&mut self, expected_pour: Option<usize>) -> bool {
        if self.state != BrewState::Brewing {
            return false;
        }
        if expected_pour.is_some_and(|pour| pour != self.pour_index) {
            return false;
        }
        self.skip_requested = true;
        true
    }

    /// Call periodically. Returns the events produced by this check.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<BrewEvent> {
        if self.state != BrewState::Brewing {
            return Vec::new();
        }
        let (Some(profile), Some(deadline)) = (self.profile.as_ref(), self.pour_deadline) else {
            warn!("brewing without a profile or deadline; finishing session");
            return self.finish(now);
        };

        let skipped = self.skip_requested && now < deadline;
        if now < deadline && !self.skip_requested {
            return vec![BrewEvent::Tick {
                pour_index: self.pour_index,
                remaining_ms: self.remaining(now).as_millis() as u64,
            }];
        }

        self.skip_requested = false;
        let pour_count = profile.pour_count as usize;
        let mut events = vec![BrewEvent::PourCompleted {
            pour_index: self.pour_index,
            pour_count,
            skipped,
            profile: profile.clone(),
            at: now,
        }];

        if self.pour_index >= pour_count {
            events.extend(self.finish(now));
            return events;
        }

        let next = self.pour_index + 1;
        match profile.interval(next) {
            Some(secs) => {
                let deadline = now + seconds(secs);
                self.pour_index = next;
                self.pour_deadline = Some(deadline);
                events.push(BrewEvent::PourStarted {
                    pour_index: next,
                    pour_count,
                    deadline,
                });
            }
            None => {
                warn!(pour = next, "schedule has no interval for pour; finishing session");
                events.extend(self.finish(now));
            }
        }
        events
    }

    /// Clear all session fields and return to `Idle`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, now: DateTime<Utc>) -> Vec<BrewEvent> {
        self.state = BrewState::Finished;
        self.pour_deadline = None;
        self.skip_requested = false;
        match self.profile.clone() {
            Some(profile) => vec![BrewEvent::SessionFinished { profile, at: now }],
            None => {
                self.reset();
                Vec::new()
            }
        }
    }
}

impl Default for BrewEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn seconds(secs: u32) -> TimeDelta {
    TimeDelta::seconds(i64::from(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::default() + TimeDelta::seconds(secs)
    }

    fn assam() -> TeaProfile {
        TeaProfile::new("Assam", vec![30, 90])
    }

    fn completions(events: &[BrewEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                BrewEvent::PourCompleted { pour_index, .. } => Some(*pour_index),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_sets_first_deadline() {
        let mut engine = BrewEngine::new();
        let events = engine.start(assam(), t(0)).unwrap();
        assert_eq!(engine.state(), BrewState::Brewing);
        assert_eq!(engine.pour_index(), 1);
        assert_eq!(
            events,
            vec![BrewEvent::PourStarted {
                pour_index: 1,
                pour_count: 2,
                deadline: t(30)
            }]
        );
    }

    #[test]
    fn start_rejects_invalid_schedule_without_changes() {
        let mut engine = BrewEngine::new();
        engine.start(assam(), t(0)).unwrap();
        let err = engine.start(TeaProfile::new("Bad", vec![0]), t(5));
        assert_eq!(err, Err(ProfileError::ZeroInterval(1)));
        assert_eq!(engine.profile().map(|p| p.name.as_str()), Some("Assam"));
        assert_eq!(engine.pour_deadline(), Some(t(30)));
    }

    #[test]
    fn poll_before_deadline_ticks() {
        let mut engine = BrewEngine::new();
        engine.start(assam(), t(0)).unwrap();
        let events = engine.poll(t(12));
        assert_eq!(
            events,
            vec![BrewEvent::Tick {
                pour_index: 1,
                remaining_ms: 18_000
            }]
        );
    }

    #[test]
    fn full_schedule_runs_to_finished() {
        let mut engine = BrewEngine::new();
        engine.start(assam(), t(0)).unwrap();

        let events = engine.poll(t(30));
        assert_eq!(completions(&events), vec![1]);
        assert!(matches!(
            events.last(),
            Some(BrewEvent::PourStarted { pour_index: 2, deadline, .. }) if *deadline == t(120)
        ));

        let events = engine.poll(t(120));
        assert_eq!(completions(&events), vec![2]);
        assert!(matches!(events.last(), Some(BrewEvent::SessionFinished { .. })));
        assert_eq!(engine.state(), BrewState::Finished);
        assert_eq!(engine.finished_profile().map(|p| p.name.as_str()), Some("Assam"));
        assert!(engine.poll(t(500)).is_empty());
    }

    #[test]
    fn skip_completes_pour_early() {
        let mut engine = BrewEngine::new();
        engine.start(assam(), t(0)).unwrap();
        assert!(engine.request_skip(None));

        let events = engine.poll(t(10));
        assert!(matches!(
            events.first(),
            Some(BrewEvent::PourCompleted { pour_index: 1, skipped: true, .. })
        ));
        assert_eq!(engine.pour_deadline(), Some(t(100)));
        assert!(!engine.skip_requested());
    }

    #[test]
    fn skip_for_stale_pour_is_ignored() {
        let mut engine = BrewEngine::new();
        engine.start(assam(), t(0)).unwrap();
        engine.poll(t(30));
        assert!(!engine.request_skip(Some(1)));
        assert!(engine.request_skip(Some(2)));
    }

    #[test]
    fn skip_outside_brewing_is_noop() {
        let mut engine = BrewEngine::new();
        assert!(!engine.request_skip(None));
        assert!(!engine.skip_requested());
    }

    #[test]
    fn reset_goes_to_idle() {
        let mut engine = BrewEngine::new();
        engine.start(assam(), t(0)).unwrap();
        engine.reset();
        assert_eq!(engine.state(), BrewState::Idle);
        assert_eq!(engine.pour_index(), 0);
        assert!(engine.profile().is_none());
        assert_eq!(engine.remaining(t(1)), Duration::ZERO);
    }

    #[test]
    fn snapshot_reflects_progress() {
        let mut engine = BrewEngine::new();
        engine.start(assam(), t(0)).unwrap();
        let snap = engine.snapshot(7, t(20));
        assert_eq!(snap.session_id, 7);
        assert_eq!(snap.state, BrewState::Brewing);
        assert_eq!(snap.tea_name.as_deref(), Some("Assam"));
        assert_eq!(snap.pour_count, 2);
        assert_eq!(snap.remaining_ms, 10_000);
    }

    #[test]
    fn missing_deadline_finishes_session() {
        let mut engine = BrewEngine::new();
        engine.start(assam(), t(0)).unwrap();
        engine.pour_deadline = None;

        let events = engine.poll(t(5));
        assert!(matches!(
            events.as_slice(),
            [BrewEvent::SessionFinished { profile, .. }] if profile.name == "Assam"
        ));
        assert_eq!(engine.state(), BrewState::Finished);
    }

    #[test]
    fn missing_next_interval_finishes_session() {
        let mut engine = BrewEngine::new();
        engine.start(assam(), t(0)).unwrap();
        if let Some(profile) = engine.profile.as_mut() {
            profile.pour_intervals_seconds.truncate(1);
        }

        let events = engine.poll(t(30));
        assert_eq!(completions(&events), vec![1]);
        assert!(matches!(events.last(), Some(BrewEvent::SessionFinished { .. })));
        assert_eq!(engine.state(), BrewState::Finished);
        assert!(engine.poll(t(200)).is_empty());
    }
}
