//! Scheduling shell around [`ClockEngine`].
//!
//! The engine itself is pure; this controller supplies wall-clock time and
//! runs four distinct schedules on the tokio timer:
//!
//! - a 50 ms ticker for display smoothness,
//! - a 1 s watchdog that rechecks elapsed time independently,
//! - a one-shot forced-completion sleep at `remaining + 100 ms`,
//! - a one-shot early-warning sleep at `remaining - 30 s`.
//!
//! The ticker alone would be enough on a friendly host; the other three
//! cover hosts that throttle and suspend timers.
//!
//! Every pause/stop/phase transition aborts all four before arming new
//! ones -- a stale schedule is how a timer double-completes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::engine::{ClockEngine, SessionSnapshot};
use crate::alarm::AlarmController;
use crate::events::{ClockObserver, Event};

const TICK_INTERVAL: Duration = Duration::from_millis(50);
const WATCHDOG_INTERVAL: Duration = Duration::from_secs(1);
const COMPLETION_BUFFER: Duration = Duration::from_millis(100);

#[derive(Default)]
struct TaskSet {
    ticker: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
    completion: Option<JoinHandle<()>>,
    warning: Option<JoinHandle<()>>,
}

impl TaskSet {
    fn abort_all(&mut self) {
        for task in [
            self.ticker.take(),
            self.watchdog.take(),
            self.completion.take(),
            self.warning.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
    }
}

/// Drives the timer engine and relays its events to registered observers,
/// in registration order. Clone-cheap; all state is shared.
#[derive(Clone)]
pub struct ClockController {
    engine: Arc<Mutex<ClockEngine>>,
    alarm: AlarmController,
    observers: Arc<Mutex<Vec<Box<dyn ClockObserver>>>>,
    tasks: Arc<Mutex<TaskSet>>,
}

impl ClockController {
    pub fn new(engine: ClockEngine, alarm: AlarmController) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            alarm,
            observers: Arc::new(Mutex::new(Vec::new())),
            tasks: Arc::new(Mutex::new(TaskSet::default())),
        }
    }

    pub async fn add_observer(&self, observer: Box<dyn ClockObserver>) {
        self.observers.lock().await.push(observer);
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.engine.lock().await.snapshot()
    }

    /// Start or resume the countdown and arm all four schedules.
    pub async fn start(&self) {
        let events = { self.engine.lock().await.start(Utc::now()) };
        if events.is_empty() {
            return;
        }
        self.dispatch(&events).await;
        self.arm_schedules().await;
    }

    /// Freeze the countdown and clear every schedule.
    pub async fn pause(&self) {
        let events = { self.engine.lock().await.pause(Utc::now()) };
        self.tasks.lock().await.abort_all();
        self.dispatch(&events).await;
    }

    /// Reset the current phase and clear every schedule.
    pub async fn stop(&self) {
        let events = { self.engine.lock().await.stop(Utc::now()) };
        self.tasks.lock().await.abort_all();
        self.dispatch(&events).await;
    }

    /// Change phase lengths, effective immediately even mid-session.
    pub async fn update_times(&self, sitting_minutes: u32, standing_minutes: u32) {
        let (events, running) = {
            let mut engine = self.engine.lock().await;
            let events = engine.update_times(sitting_minutes, standing_minutes, Utc::now());
            (events, engine.is_running())
        };
        self.tasks.lock().await.abort_all();
        self.dispatch(&events).await;
        if running {
            self.arm_schedules().await;
        }
    }

    /// On-demand re-sync, for hosts that can tell when they come back
    /// from suspension. Catches up the display and forces any completion
    /// that was missed while schedules were frozen.
    pub async fn resync(&self) {
        let events = {
            let mut engine = self.engine.lock().await;
            let now = Utc::now();
            let mut events = engine.tick(now);
            events.extend(engine.check_missed_completion(now));
            events
        };
        self.react(events).await;
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Abort whatever is scheduled and arm fresh schedules for the
    /// engine's current phase.
    ///
    /// Returns a boxed `Send` future: a scheduled task can call back into
    /// this method (via `react`), and an explicit future type is required
    /// to break the async-recursion auto-trait cycle for `tokio::spawn`.
    fn arm_schedules(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
        let (remaining, warning_in, running) = {
            let engine = self.engine.lock().await;
            (
                engine.remaining_secs(),
                engine.warning_in_secs(),
                engine.is_running(),
            )
        };

        let mut tasks = self.tasks.lock().await;
        tasks.abort_all();
        if !running {
            return;
        }

        let this = self.clone();
        tasks.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let events = { this.engine.lock().await.tick(Utc::now()) };
                if this.react(events).await {
                    break;
                }
            }
        }));

        let this = self.clone();
        tasks.watchdog = Some(tokio::spawn(async move {
            let mut interval = time::interval(WATCHDOG_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let events = { this.engine.lock().await.check_missed_completion(Utc::now()) };
                if this.react(events).await {
                    break;
                }
            }
        }));

        let this = self.clone();
        tasks.completion = Some(tokio::spawn(async move {
            time::sleep(Duration::from_secs(remaining) + COMPLETION_BUFFER).await;
            let events = { this.engine.lock().await.check_missed_completion(Utc::now()) };
            this.react(events).await;
        }));

        if let Some(lead) = warning_in {
            // A still-looping alarm from the previous phase must not
            // overlap the next one.
            self.alarm.preempt_in(Duration::from_secs(lead)).await;
            let this = self.clone();
            tasks.warning = Some(tokio::spawn(async move {
                time::sleep(Duration::from_secs(lead)).await;
                this.run_warning().await;
            }));
        }
        })
    }

    async fn run_warning(&self) {
        let transition = { self.engine.lock().await.fire_warning() };
        let Some(transition) = transition else {
            return;
        };
        self.dispatch(&[Event::WarningRaised {
            transition,
            at: Utc::now(),
        }])
        .await;
        self.alarm.announce(transition).await;
    }

    /// Handle a batch of engine events. Returns true when the phase
    /// rolled over, in which case fresh schedules are armed from a new
    /// task (the caller may be one of the tasks about to be aborted).
    async fn react(&self, events: Vec<Event>) -> bool {
        if events.is_empty() {
            return false;
        }
        for event in &events {
            if let Event::PhaseCompleted {
                phase,
                warned: false,
                ..
            } = event
            {
                // The phase was too short for an early warning, so the
                // announcement happens at the completion instant.
                self.alarm.announce(phase.upcoming_transition()).await;
            }
        }
        self.dispatch(&events).await;
        let rolled = events
            .iter()
            .any(|e| matches!(e, Event::PhaseChanged { .. }));
        if rolled {
            let this = self.clone();
            tokio::spawn(async move {
                this.arm_schedules().await;
            });
        }
        rolled
    }

    async fn dispatch(&self, events: &[Event]) {
        let mut observers = self.observers.lock().await;
        for event in events {
            for observer in observers.iter_mut() {
                observer.on_event(event);
                match event {
                    Event::Tick {
                        remaining_secs,
                        phase,
                        ..
                    } => observer.on_tick(*remaining_secs, *phase),
                    Event::PhaseChanged { phase, .. } => observer.on_phase_change(*phase),
                    Event::CycleCompleted { .. } => observer.on_cycle_complete(),
                    _ => {}
                }
            }
        }
    }
}
