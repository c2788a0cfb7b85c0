use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::TeaProfile;
use crate::timer::SessionObserver;

/// Every brew session transition produces an Event.
/// Observers receive them as calls; the CLI receives them through a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BrewEvent {
    PourStarted {
        pour_index: usize,
        pour_count: usize,
        deadline: DateTime<Utc>,
    },
    Tick {
        pour_index: usize,
        remaining_ms: u64,
    },
    /// The reminder for a pour. Pacing never waits for it to be acknowledged.
    PourCompleted {
        pour_index: usize,
        pour_count: usize,
        skipped: bool,
        profile: TeaProfile,
        at: DateTime<Utc>,
    },
    SessionFinished {
        profile: TeaProfile,
        at: DateTime<Utc>,
    },
}

impl BrewEvent {
    /// Deliver this event to the matching observer callback.
    pub fn dispatch<O: SessionObserver + ?Sized>(&self, observer: &O) {
        match self {
            BrewEvent::PourStarted {
                pour_index,
                deadline,
                ..
            } => observer.on_pour_started(*pour_index, *deadline),
            BrewEvent::Tick { remaining_ms, .. } => {
                observer.on_tick(std::time::Duration::from_millis(*remaining_ms))
            }
            BrewEvent::PourCompleted {
                pour_index,
                profile,
                ..
            } => observer.on_pour_completed(*pour_index, profile),
            BrewEvent::SessionFinished { profile, .. } => observer.on_session_finished(profile),
        }
    }

    /// Pour index this event refers to, if any.
    pub fn pour_index(&self) -> Option<usize> {
        match self {
            BrewEvent::PourStarted { pour_index, .. }
            | BrewEvent::Tick { pour_index, .. }
            | BrewEvent::PourCompleted { pour_index, .. } => Some(*pour_index),
            BrewEvent::SessionFinished { .. } => None,
        }
    }

    pub fn is_tick(&self) -> bool {
        matches!(self, BrewEvent::Tick { .. })
    }
}
