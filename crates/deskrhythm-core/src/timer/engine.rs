//! Sit/stand timer engine.
//!
//! The engine is a wall-clock-based state machine. It holds no threads and
//! no timers -- the caller schedules `tick()`/`check_missed_completion()`
//! and passes the current time into every operation, so all timing
//! semantics are deterministic under test.
//!
//! Remaining time is always recomputed from the phase start instant and
//! "now", never accumulated by counting ticks. That is what keeps the
//! countdown honest when the host throttles or suspends scheduled work.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused ; any -> Idle via stop()
//! ```
//!
//! The sitting/standing phase is orthogonal to the run state and flips
//! only on natural completion.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Seconds before a phase ends at which the early alarm fires.
pub const WARNING_LEAD_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Sitting,
    Standing,
}

impl Phase {
    pub fn flip(self) -> Self {
        match self {
            Phase::Sitting => Phase::Standing,
            Phase::Standing => Phase::Sitting,
        }
    }

    pub fn is_sitting(self) -> bool {
        self == Phase::Sitting
    }

    /// The transition announced near the end of this phase.
    pub fn upcoming_transition(self) -> Transition {
        match self {
            Phase::Sitting => Transition::StandUp,
            Phase::Standing => Transition::SitDown,
        }
    }
}

/// The two phase transitions a user is alerted about. Alarm sounds and
/// volumes are configured per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    StandUp,
    SitDown,
}

/// Read-only view of the current session.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub remaining_secs: u64,
    pub running: bool,
}

/// Core timer state machine.
///
/// Operates on wall-clock instants supplied by the caller.
#[derive(Debug, Clone)]
pub struct ClockEngine {
    sitting_secs: u64,
    standing_secs: u64,
    phase: Phase,
    /// Full planned duration of the current phase in seconds.
    planned_secs: u64,
    /// Cached countdown value, recomputed from `started_at` on every tick.
    remaining_secs: u64,
    /// When the current phase began running. `None` means the next start
    /// is a fresh start rather than a resume.
    started_at: Option<DateTime<Utc>>,
    running: bool,
    /// Whether the early alarm already fired for this phase instance.
    warning_fired: bool,
}

impl ClockEngine {
    pub fn new(sitting_minutes: u32, standing_minutes: u32) -> Self {
        let mut engine = Self {
            sitting_secs: 0,
            standing_secs: 0,
            phase: Phase::Sitting,
            planned_secs: 0,
            remaining_secs: 0,
            started_at: None,
            running: false,
            warning_fired: false,
        };
        engine.initialize(sitting_minutes, standing_minutes);
        engine
    }

    /// Reset to idle with the given phase lengths. Non-positive minutes
    /// are floored to 1 rather than rejected.
    pub fn initialize(&mut self, sitting_minutes: u32, standing_minutes: u32) {
        self.sitting_secs = u64::from(sitting_minutes.max(1)) * 60;
        self.standing_secs = u64::from(standing_minutes.max(1)) * 60;
        self.phase = Phase::Sitting;
        self.planned_secs = self.sitting_secs;
        self.remaining_secs = self.sitting_secs;
        self.started_at = None;
        self.running = false;
        self.warning_fired = false;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn planned_secs(&self) -> u64 {
        self.planned_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            running: self.running,
        }
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        if self.planned_secs == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / self.planned_secs as f64)
    }

    /// Seconds until the early alarm should fire, or `None` when the
    /// phase is too short for one (or it already fired).
    pub fn warning_in_secs(&self) -> Option<u64> {
        if self.warning_fired || self.remaining_secs <= WARNING_LEAD_SECS {
            return None;
        }
        Some(self.remaining_secs - WARNING_LEAD_SECS)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start, or resume from a pause. No-op when already running.
    ///
    /// A fresh start resets the countdown to the current phase's full
    /// duration; a resume back-dates the start instant so the elapsed
    /// time so far is preserved.
    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.running {
            return Vec::new();
        }
        if self.started_at.is_none() || self.remaining_secs >= self.planned_secs {
            self.planned_secs = self.phase_secs(self.phase);
            self.remaining_secs = self.planned_secs;
            self.warning_fired = false;
        }
        let elapsed = self.planned_secs - self.remaining_secs;
        self.started_at = Some(now - Duration::seconds(elapsed as i64));
        self.running = true;
        vec![
            Event::PhaseStarted {
                phase: self.phase,
                planned_secs: self.planned_secs,
                remaining_secs: self.remaining_secs,
                at: now,
            },
            Event::Tick {
                remaining_secs: self.remaining_secs,
                phase: self.phase,
                at: now,
            },
        ]
    }

    /// Freeze the countdown. The start instant is retained so a later
    /// `start()` resumes from the frozen remainder.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        self.running = false;
        if let Some(started) = self.started_at {
            self.remaining_secs = self.planned_secs.saturating_sub(elapsed_secs(started, now));
        }
        vec![Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: now,
        }]
    }

    /// Stop and reset the countdown to the current phase's full planned
    /// duration. Clearing the start instant is what marks the next
    /// `start()` as fresh rather than a resume.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.pause(now);
        self.planned_secs = self.phase_secs(self.phase);
        self.remaining_secs = self.planned_secs;
        self.started_at = None;
        vec![
            Event::TimerStopped {
                remaining_secs: self.remaining_secs,
                at: now,
            },
            Event::Tick {
                remaining_secs: self.remaining_secs,
                phase: self.phase,
                at: now,
            },
        ]
    }

    /// Recompute the countdown from wall clock. Emits nothing when the
    /// displayed value is unchanged; completes the phase at zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        let Some(started) = self.started_at else {
            return Vec::new();
        };
        let fresh = self.planned_secs.saturating_sub(elapsed_secs(started, now));
        if fresh == self.remaining_secs {
            return Vec::new();
        }
        self.remaining_secs = fresh;
        let mut events = vec![Event::Tick {
            remaining_secs: fresh,
            phase: self.phase,
            at: now,
        }];
        if fresh == 0 {
            events.extend(self.complete_phase(now));
        }
        events
    }

    /// Backstop against throttled scheduling: if wall clock says the
    /// phase already ended but the cached countdown is still positive,
    /// force the completion immediately.
    pub fn check_missed_completion(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        let Some(started) = self.started_at else {
            return Vec::new();
        };
        let actually_left = self.planned_secs.saturating_sub(elapsed_secs(started, now));
        if actually_left == 0 && self.remaining_secs > 0 {
            self.remaining_secs = 0;
            return self.complete_phase(now);
        }
        Vec::new()
    }

    /// One-shot guard for the early alarm. Returns the transition to
    /// announce the first time it is called per phase instance.
    pub fn fire_warning(&mut self) -> Option<Transition> {
        if !self.running || self.warning_fired {
            return None;
        }
        self.warning_fired = true;
        Some(self.phase.upcoming_transition())
    }

    /// Change phase lengths, taking effect immediately even mid-session:
    /// the current phase restarts at its new full duration.
    pub fn update_times(
        &mut self,
        sitting_minutes: u32,
        standing_minutes: u32,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let was_running = self.running;
        self.pause(now);
        self.sitting_secs = u64::from(sitting_minutes.max(1)) * 60;
        self.standing_secs = u64::from(standing_minutes.max(1)) * 60;
        self.planned_secs = self.phase_secs(self.phase);
        self.remaining_secs = self.planned_secs;
        self.started_at = None;
        if was_running {
            self.start(now)
        } else {
            vec![Event::Tick {
                remaining_secs: self.remaining_secs,
                phase: self.phase,
                at: now,
            }]
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn phase_secs(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Sitting => self.sitting_secs,
            Phase::Standing => self.standing_secs,
        }
    }

    /// Flip to the other phase and keep running. A finished Standing
    /// phase closes a full sit+stand cycle.
    fn complete_phase(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let finished = self.phase;
        let warned = self.warning_fired;
        self.phase = finished.flip();

        let mut events = vec![Event::PhaseCompleted {
            phase: finished,
            warned,
            at: now,
        }];
        if finished == Phase::Standing {
            events.push(Event::CycleCompleted { at: now });
        }
        events.push(Event::PhaseChanged {
            phase: self.phase,
            at: now,
        });

        self.planned_secs = self.phase_secs(self.phase);
        self.remaining_secs = self.planned_secs;
        self.started_at = Some(now);
        self.running = true;
        self.warning_fired = false;

        events.push(Event::Tick {
            remaining_secs: self.remaining_secs,
            phase: self.phase,
            at: now,
        });
        events
    }
}

fn elapsed_secs(started: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - started).num_seconds().max(0) as u64
}

/// Format a second count as `MM:SS` for countdown displays.
pub fn format_clock(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
