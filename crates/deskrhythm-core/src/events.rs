use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, Transition};

/// Every state change in the timer produces an Event.
///
/// The engine returns events from its operations; the controller relays
/// them to registered observers in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PhaseStarted {
        phase: Phase,
        planned_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Fired whenever the displayed remaining time changes, including
    /// immediately on start/stop and on every phase boundary.
    Tick {
        remaining_secs: u64,
        phase: Phase,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran to its natural end. `warned` records whether the early
    /// alarm fired for this phase instance (short phases skip it).
    PhaseCompleted {
        phase: Phase,
        warned: bool,
        at: DateTime<Utc>,
    },
    /// Fired exactly once per phase flip, after the state has already
    /// transitioned. Carries the new phase.
    PhaseChanged {
        phase: Phase,
        at: DateTime<Utc>,
    },
    /// A full sit+stand cycle closed (fires when a standing phase ends).
    CycleCompleted {
        at: DateTime<Utc>,
    },
    /// The early alarm came due for the given transition.
    WarningRaised {
        transition: Transition,
        at: DateTime<Utc>,
    },
}

/// Subscriber interface for timer state changes.
///
/// Observers are registered on the controller in an ordered list and are
/// invoked synchronously from its scheduled handlers; hooks default to
/// no-ops so implementations pick only what they need. Hooks must not
/// panic -- there is no one above them to catch it.
pub trait ClockObserver: Send {
    /// The displayed remaining time changed.
    fn on_tick(&mut self, _remaining_secs: u64, _phase: Phase) {}

    /// The phase flipped; `phase` is the one now running.
    fn on_phase_change(&mut self, _phase: Phase) {}

    /// A full sit+stand cycle closed.
    fn on_cycle_complete(&mut self) {}

    /// Catch-all for presentation layers that want the raw stream.
    fn on_event(&mut self, _event: &Event) {}
}
