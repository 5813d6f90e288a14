//! End-to-end exercise of the public timer surface: settings feed the
//! engine, the controller schedules real ticks, observers see the stream.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use deskrhythm_core::{
    AlarmController, AlarmSink, ClockController, ClockEngine, ClockObserver, Event, Phase,
    PlaybackError, SettingsStore,
};

struct NullSink;

impl AlarmSink for NullSink {
    fn play(
        &self,
        _sound: deskrhythm_core::alarm::AlarmSound,
        _looped: bool,
        _volume: f32,
    ) -> Result<(), PlaybackError> {
        Ok(())
    }
    fn set_volume(&self, _volume: f32) {}
    fn stop(&self) {}
    fn is_finished(&self) -> bool {
        true
    }
}

#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    fn last_tick(&self) -> Option<u64> {
        self.events().iter().rev().find_map(|e| match e {
            Event::Tick { remaining_secs, .. } => Some(*remaining_secs),
            _ => None,
        })
    }
}

impl ClockObserver for EventLog {
    fn on_event(&mut self, event: &Event) {
        self.0.lock().unwrap().push(event.clone());
    }
}

async fn build() -> (ClockController, EventLog, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SettingsStore::with_path(dir.path().join("settings.toml")));
    let settings = store.get();

    let alarm = AlarmController::new(Arc::new(NullSink), store.clone());
    let engine = ClockEngine::new(settings.sitting_minutes, settings.standing_minutes);
    let controller = ClockController::new(engine, alarm);

    let log = EventLog::default();
    controller.add_observer(Box::new(log.clone())).await;
    (controller, log, dir)
}

#[tokio::test]
async fn countdown_runs_pauses_resumes_and_resets() {
    let (controller, log, _dir) = build().await;

    // Defaults: 20 minutes sitting.
    controller.start().await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    controller.pause().await;

    let events = log.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::PhaseStarted { phase: Phase::Sitting, planned_secs: 1200, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Tick { remaining_secs: 1200, .. })));
    // The ticker counted down at least one displayed second.
    let frozen = log.last_tick().unwrap();
    assert!(frozen < 1200 && frozen >= 1197, "remaining was {frozen}");
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::TimerPaused { .. })));

    // Resuming continues from the frozen remainder, not from 20:00.
    controller.start().await;
    let snap = controller.snapshot().await;
    assert!(snap.running);
    assert!(snap.remaining_secs < 1200 && snap.remaining_secs >= 1197);

    // Stop resets to the full phase duration and clears resumability.
    controller.stop().await;
    let snap = controller.snapshot().await;
    assert!(!snap.running);
    assert_eq!(snap.remaining_secs, 1200);
    assert_eq!(log.last_tick(), Some(1200));
}

#[tokio::test]
async fn time_changes_apply_immediately() {
    let (controller, log, _dir) = build().await;

    controller.start().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.update_times(30, 15).await;

    let snap = controller.snapshot().await;
    assert!(snap.running);
    assert_eq!(snap.remaining_secs, 1800);
    assert_eq!(snap.phase, Phase::Sitting);
    assert_eq!(log.last_tick(), Some(1800));

    controller.stop().await;
}
