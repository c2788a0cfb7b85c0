//! Brew session lifecycle driven by a virtual clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use brewmate_core::{
    BrewEvent, BrewSession, BrewState, ChannelObserver, SessionObserver, TeaProfile, VirtualClock,
};
use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Default)]
struct Recorder(Mutex<Vec<BrewEvent>>);

impl SessionObserver for Recorder {
    fn on_event(&self, event: &BrewEvent) {
        if !event.is_tick() {
            self.0.lock().unwrap().push(event.clone());
        }
    }
}

impl Recorder {
    fn take(&self) -> Vec<BrewEvent> {
        std::mem::take(&mut *self.0.lock().unwrap())
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

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn assam() -> TeaProfile {
    TeaProfile::new("Assam", vec![30, 90])
}

/// Shape of a non-tick event, without payload noise.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Started(usize),
    Completed(usize),
    Finished,
}

fn steps(events: &[BrewEvent]) -> Vec<Step> {
    events
        .iter()
        .filter_map(|e| match e {
            BrewEvent::PourStarted { pour_index, .. } => Some(Step::Started(*pour_index)),
            BrewEvent::PourCompleted { pour_index, .. } => Some(Step::Completed(*pour_index)),
            BrewEvent::SessionFinished { .. } => Some(Step::Finished),
            BrewEvent::Tick { .. } => None,
        })
        .collect()
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn two_pour_schedule_runs_to_completion() {
    let (clock, session, recorder) = setup();
    session.start(assam()).unwrap();

    clock.advance(secs(30));
    let events = recorder.take();
    assert_eq!(steps(&events), vec![Step::Started(1), Step::Completed(1), Step::Started(2)]);
    assert!(matches!(
        events[1],
        BrewEvent::PourCompleted { skipped: false, at, .. } if at == t(30)
    ));
    assert!(matches!(
        events[2],
        BrewEvent::PourStarted { pour_index: 2, deadline, .. } if deadline == t(120)
    ));
    assert_eq!(session.snapshot().pour_index, 2);

    clock.advance(secs(90));
    let events = recorder.take();
    assert_eq!(steps(&events), vec![Step::Completed(2), Step::Finished]);
    assert!(matches!(
        &events[1],
        BrewEvent::SessionFinished { profile, at } if profile.name == "Assam" && *at == t(120)
    ));

    assert_eq!(session.state(), BrewState::Finished);
    assert_eq!(session.finished_profile().unwrap().name, "Assam");
    assert_eq!(session.remaining(), Duration::ZERO);

    // nothing further once finished
    clock.advance(secs(600));
    assert!(recorder.take().is_empty());
}

#[test]
fn skip_completes_current_pour_immediately() {
    let (clock, session, recorder) = setup();
    session.start(assam()).unwrap();
    recorder.take();

    clock.advance(secs(10));
    assert!(session.skip());
    clock.run_due();

    let events = recorder.take();
    assert_eq!(steps(&events), vec![Step::Completed(1), Step::Started(2)]);
    assert!(matches!(
        events[0],
        BrewEvent::PourCompleted { pour_index: 1, skipped: true, at, .. } if at == t(10)
    ));
    assert!(matches!(
        events[1],
        BrewEvent::PourStarted { pour_index: 2, deadline, .. } if deadline == t(100)
    ));

    // pour 1's original deadline passes without a second completion
    clock.advance(secs(25));
    assert!(recorder.take().is_empty());

    clock.advance(secs(65));
    assert_eq!(steps(&recorder.take()), vec![Step::Completed(2), Step::Finished]);
}

#[test]
fn skip_pour_ignores_stale_index() {
    let (clock, session, recorder) = setup();
    session.start(assam()).unwrap();
    recorder.take();

    assert!(!session.skip_pour(2));
    clock.run_due();
    assert!(recorder.take().is_empty());

    assert!(session.skip_pour(1));
    clock.run_due();
    assert_eq!(steps(&recorder.take()), vec![Step::Completed(1), Step::Started(2)]);

    assert!(!session.skip_pour(1));
}

#[test]
fn skip_when_idle_or_finished_is_noop() {
    let (clock, session, _recorder) = setup();
    assert!(!session.skip());

    session.start(TeaProfile::new("Sencha", vec![5])).unwrap();
    clock.advance(secs(5));
    assert_eq!(session.state(), BrewState::Finished);
    assert!(!session.skip());
}

#[test]
fn new_start_supersedes_running_session() {
    let (clock, session, recorder) = setup();
    let first = session.start(assam()).unwrap();
    clock.advance(secs(10));

    let second = session.start(TeaProfile::new("Keemun", vec![60])).unwrap();
    assert!(second > first);
    recorder.take();

    // the first session's pour 1 deadline (t=30) must stay silent
    clock.advance(secs(25));
    assert!(recorder.take().is_empty());
    assert_eq!(session.snapshot().tea_name.as_deref(), Some("Keemun"));

    clock.advance(secs(35));
    let events = recorder.take();
    assert_eq!(steps(&events), vec![Step::Completed(1), Step::Finished]);
    assert!(matches!(
        &events[1],
        BrewEvent::SessionFinished { profile, at } if profile.name == "Keemun" && *at == t(70)
    ));
}

#[test]
fn reset_is_idempotent() {
    let (clock, session, recorder) = setup();
    session.start(assam()).unwrap();
    recorder.take();

    session.reset();
    session.reset();
    assert_eq!(session.state(), BrewState::Idle);
    assert!(session.finished_profile().is_none());

    clock.advance(secs(300));
    assert!(recorder.take().is_empty());
}

#[test]
fn reset_after_finish_clears_profile() {
    let (clock, session, _recorder) = setup();
    session.start(TeaProfile::new("Sencha", vec![5])).unwrap();
    clock.advance(secs(5));
    assert!(session.finished_profile().is_some());

    session.reset();
    assert_eq!(session.state(), BrewState::Idle);
    assert!(session.finished_profile().is_none());
}

#[test]
fn ticks_report_shrinking_remaining_time() {
    let clock = VirtualClock::new();
    let session = BrewSession::new(Arc::new(clock.clone()));
    let (observer, rx) = ChannelObserver::new();
    session.subscribe(Arc::new(observer));

    session.start(TeaProfile::new("Sencha", vec![1])).unwrap();
    clock.advance(Duration::from_millis(1000));

    let ticks: Vec<u64> = rx
        .try_iter()
        .filter_map(|e| match e {
            BrewEvent::Tick { remaining_ms, .. } => Some(remaining_ms),
            _ => None,
        })
        .collect();
    assert!(!ticks.is_empty());
    assert!(ticks.windows(2).all(|w| w[0] > w[1]));
    assert_eq!(session.state(), BrewState::Finished);
}

#[test]
fn channel_observer_without_ticks_sees_transitions_only() {
    let clock = VirtualClock::new();
    let session = BrewSession::new(Arc::new(clock.clone()));
    let (observer, rx) = ChannelObserver::new();
    session.subscribe(Arc::new(observer.without_ticks()));

    session.start(assam()).unwrap();
    clock.advance(secs(120));

    let events: Vec<_> = rx.try_iter().collect();
    assert!(events.iter().all(|e| !e.is_tick()));
    assert_eq!(
        steps(&events),
        vec![
            Step::Started(1),
            Step::Completed(1),
            Step::Started(2),
            Step::Completed(2),
            Step::Finished
        ]
    );
}

// ============================================================================
// Ordering property
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// For any schedule and any mix of skips, pours complete exactly once
    /// each, in order, followed by one finish.
    #[test]
    fn completions_are_ordered_and_unique(
        pours in prop::collection::vec((1u32..=20, prop::option::of(0u32..20)), 1..=5)
    ) {
        let (clock, session, recorder) = setup();
        let intervals: Vec<u32> = pours.iter().map(|(i, _)| *i).collect();
        session.start(TeaProfile::new("Prop", intervals.clone())).unwrap();

        for (interval, skip_after) in &pours {
            match skip_after {
                Some(after) if after < interval => {
                    clock.advance(secs(*after as u64));
                    prop_assert!(session.skip());
                    clock.run_due();
                }
                _ => clock.advance(secs(*interval as u64)),
            }
        }
        clock.advance(secs(60));

        let mut expected = vec![Step::Started(1)];
        for k in 1..=intervals.len() {
            expected.push(Step::Completed(k));
            if k < intervals.len() {
                expected.push(Step::Started(k + 1));
            }
        }
        expected.push(Step::Finished);

        prop_assert_eq!(steps(&recorder.take()), expected);
        prop_assert_eq!(session.state(), BrewState::Finished);
    }
}
