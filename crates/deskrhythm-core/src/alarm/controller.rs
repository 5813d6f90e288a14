//! Alarm lifecycle: raise, auto-dismiss, pre-empt, clean up.
//!
//! At most one alarm is ever active. Raising a new one always tears down
//! the previous one first, and every teardown path funnels through
//! [`AlarmController::cleanup`], which is idempotent.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use super::playback::{AlarmSink, AlarmSound};
use super::prompt::PromptContent;
use crate::storage::{AlertDuration, SettingsStore};
use crate::timer::Transition;

/// How long before the next scheduled alarm a looping alarm is stopped,
/// so the two never overlap.
const PREEMPT_LEAD: Duration = Duration::from_secs(15);
/// Poll interval for detecting the natural end of a play-once alarm.
const FINISH_POLL: Duration = Duration::from_millis(250);

/// Subscriber interface for the alarm prompt. Presentation layers render
/// it; the controller only tracks its state.
pub trait AlarmObserver: Send {
    fn on_prompt_shown(&mut self, _prompt: &PromptContent) {}
    fn on_prompt_cleared(&mut self) {}
}

struct ActiveAlarm {
    transition: Transition,
    looped: bool,
}

struct PendingPlayback {
    sound: AlarmSound,
    looped: bool,
    volume: f32,
    duration: AlertDuration,
}

#[derive(Default)]
struct AlarmInner {
    active: Option<ActiveAlarm>,
    /// Set when playback was blocked; retried once on the next user
    /// interaction.
    pending_retry: Option<PendingPlayback>,
    dismiss: Option<JoinHandle<()>>,
    preempt: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct AlarmController {
    sink: Arc<dyn AlarmSink>,
    settings: Arc<SettingsStore>,
    inner: Arc<Mutex<AlarmInner>>,
    observers: Arc<Mutex<Vec<Box<dyn AlarmObserver>>>>,
}

impl AlarmController {
    pub fn new(sink: Arc<dyn AlarmSink>, settings: Arc<SettingsStore>) -> Self {
        Self {
            sink,
            settings,
            inner: Arc::new(Mutex::new(AlarmInner::default())),
            observers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn add_observer(&self, observer: Box<dyn AlarmObserver>) {
        self.observers.lock().await.push(observer);
    }

    pub async fn is_active(&self) -> bool {
        self.inner.lock().await.active.is_some()
    }

    /// Raise the alarm for an upcoming transition: sound + prompt.
    ///
    /// With audio disabled this is a complete no-op -- no sound and no
    /// prompt. A blocked playback degrades to the prompt alone, with a
    /// one-shot retry armed for the next user interaction.
    pub async fn announce(&self, transition: Transition) {
        let settings = self.settings.get();
        if !settings.audio_enabled {
            return;
        }

        self.cleanup().await;

        let sound = AlarmSound::for_transition(transition);
        let looped = settings.alert_duration == AlertDuration::Loop;
        let volume = settings.alarm_volume(transition) as f32 / 100.0;
        let prompt = PromptContent::for_transition(transition, &settings);

        {
            let mut inner = self.inner.lock().await;
            inner.active = Some(ActiveAlarm { transition, looped });
            match self.sink.play(sound, looped, volume) {
                Ok(()) => self.arm_auto_dismiss(&mut inner, settings.alert_duration),
                Err(err) => {
                    warn!("alarm playback blocked, keeping prompt and arming retry: {err}");
                    inner.pending_retry = Some(PendingPlayback {
                        sound,
                        looped,
                        volume,
                        duration: settings.alert_duration,
                    });
                }
            }
        }

        self.notify_shown(&prompt).await;
    }

    /// Idempotent teardown: stop playback, drop the prompt, cancel any
    /// dismiss/pre-empt timers. Safe with no active alarm.
    pub async fn cleanup(&self) {
        let had_active = {
            let mut inner = self.inner.lock().await;
            if let Some(task) = inner.dismiss.take() {
                task.abort();
            }
            if let Some(task) = inner.preempt.take() {
                task.abort();
            }
            inner.pending_retry = None;
            inner.active.take().is_some()
        };
        self.sink.stop();
        if had_active {
            self.notify_cleared().await;
        }
    }

    /// Live volume change from the prompt: adjusts current playback and
    /// persists the per-transition volume immediately. Clamped to 0-100.
    pub async fn set_volume(&self, volume: u32) {
        let volume = volume.min(100);
        let transition = {
            let mut inner = self.inner.lock().await;
            if let Some(pending) = inner.pending_retry.as_mut() {
                pending.volume = volume as f32 / 100.0;
            }
            inner.active.as_ref().map(|a| a.transition)
        };
        let Some(transition) = transition else {
            return;
        };
        self.sink.set_volume(volume as f32 / 100.0);
        self.settings.save_alarm_volume(transition, volume);
    }

    /// The user interacted with the app; retry a blocked playback once.
    pub async fn user_interaction(&self) {
        let pending = { self.inner.lock().await.pending_retry.take() };
        let Some(pending) = pending else {
            return;
        };
        match self.sink.play(pending.sound, pending.looped, pending.volume) {
            Ok(()) => {
                let mut inner = self.inner.lock().await;
                if inner.active.is_some() {
                    self.arm_auto_dismiss(&mut inner, pending.duration);
                }
            }
            Err(err) => warn!("alarm retry failed, staying silent: {err}"),
        }
    }

    /// The next alarm is due in `until_next_alarm`. A looping alarm is
    /// stopped 15 seconds before it -- immediately if it is closer than
    /// that -- so alarms never overlap. Other modes dismiss themselves.
    pub async fn preempt_in(&self, until_next_alarm: Duration) {
        let mut inner = self.inner.lock().await;
        if let Some(task) = inner.preempt.take() {
            task.abort();
        }
        let looping = matches!(inner.active, Some(ActiveAlarm { looped: true, .. }));
        if !looping {
            return;
        }
        if until_next_alarm > PREEMPT_LEAD {
            let this = self.clone();
            let delay = until_next_alarm - PREEMPT_LEAD;
            inner.preempt = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                this.inner.lock().await.preempt.take();
                this.cleanup().await;
            }));
        } else {
            drop(inner);
            self.cleanup().await;
        }
    }

    fn arm_auto_dismiss(&self, inner: &mut AlarmInner, duration: AlertDuration) {
        match duration {
            AlertDuration::Loop => {}
            AlertDuration::Once => {
                let this = self.clone();
                inner.dismiss = Some(tokio::spawn(async move {
                    loop {
                        tokio::time::sleep(FINISH_POLL).await;
                        if this.sink.is_finished() {
                            this.inner.lock().await.dismiss.take();
                            this.cleanup().await;
                            break;
                        }
                    }
                }));
            }
            AlertDuration::Fixed(secs) => {
                let this = self.clone();
                inner.dismiss = Some(tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(secs.into())).await;
                    this.inner.lock().await.dismiss.take();
                    this.cleanup().await;
                }));
            }
        }
    }

    async fn notify_shown(&self, prompt: &PromptContent) {
        let mut observers = self.observers.lock().await;
        for observer in observers.iter_mut() {
            observer.on_prompt_shown(prompt);
        }
    }

    async fn notify_cleared(&self) {
        let mut observers = self.observers.lock().await;
        for observer in observers.iter_mut() {
            observer.on_prompt_cleared();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingSink {
        calls: StdMutex<Vec<String>>,
        fail_next_play: AtomicBool,
        finished: AtomicBool,
    }

    impl RecordingSink {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AlarmSink for RecordingSink {
        fn play(&self, sound: AlarmSound, looped: bool, volume: f32) -> Result<(), PlaybackError> {
            if self.fail_next_play.swap(false, Ordering::SeqCst) {
                self.calls.lock().unwrap().push("play blocked".into());
                return Err(PlaybackError::OutputUnavailable("blocked".into()));
            }
            self.calls
                .lock()
                .unwrap()
                .push(format!("play {sound:?} looped={looped} volume={volume:.2}"));
            self.finished.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn set_volume(&self, volume: f32) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("set_volume {volume:.2}"));
        }

        fn stop(&self) {
            self.calls.lock().unwrap().push("stop".into());
            self.finished.store(true, Ordering::SeqCst);
        }

        fn is_finished(&self) -> bool {
            self.finished.load(Ordering::SeqCst)
        }
    }

    struct RecordingPromptView(Arc<StdMutex<Vec<String>>>);

    impl AlarmObserver for RecordingPromptView {
        fn on_prompt_shown(&mut self, prompt: &PromptContent) {
            self.0
                .lock()
                .unwrap()
                .push(format!("shown {:?}", prompt.transition));
        }

        fn on_prompt_cleared(&mut self) {
            self.0.lock().unwrap().push("cleared".into());
        }
    }

    struct Fixture {
        controller: AlarmController,
        sink: Arc<RecordingSink>,
        settings: Arc<SettingsStore>,
        prompt_log: Arc<StdMutex<Vec<String>>>,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let settings = Arc::new(SettingsStore::with_path(dir.path().join("settings.toml")));
        let sink = Arc::new(RecordingSink::default());
        let controller = AlarmController::new(sink.clone(), settings.clone());
        let prompt_log = Arc::new(StdMutex::new(Vec::new()));
        controller
            .add_observer(Box::new(RecordingPromptView(prompt_log.clone())))
            .await;
        Fixture {
            controller,
            sink,
            settings,
            prompt_log,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn audio_disabled_is_fully_silent() {
        let fx = fixture().await;
        fx.settings.update(|s| s.audio_enabled = false);

        fx.controller.announce(Transition::StandUp).await;

        assert!(fx.sink.calls().is_empty());
        assert!(fx.prompt_log.lock().unwrap().is_empty());
        assert!(!fx.controller.is_active().await);
    }

    #[tokio::test]
    async fn announce_tears_down_the_previous_alarm() {
        let fx = fixture().await;
        fx.controller.announce(Transition::StandUp).await;
        fx.controller.announce(Transition::SitDown).await;

        let calls = fx.sink.calls();
        let second_play = calls
            .iter()
            .position(|c| c.contains("SitDownChime"))
            .unwrap();
        assert!(
            calls[..second_play].iter().any(|c| c == "stop"),
            "expected teardown before the second play, got {calls:?}"
        );
        assert_eq!(
            *fx.prompt_log.lock().unwrap(),
            vec!["shown StandUp", "cleared", "shown SitDown"]
        );
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let fx = fixture().await;
        fx.controller.announce(Transition::StandUp).await;
        fx.controller.cleanup().await;
        fx.controller.cleanup().await;

        let cleared = fx
            .prompt_log
            .lock()
            .unwrap()
            .iter()
            .filter(|l| *l == "cleared")
            .count();
        assert_eq!(cleared, 1);
        assert!(!fx.controller.is_active().await);
    }

    #[tokio::test]
    async fn volume_change_clamps_and_persists() {
        let fx = fixture().await;
        fx.controller.announce(Transition::StandUp).await;
        fx.controller.set_volume(250).await;

        assert!(fx.sink.calls().iter().any(|c| c == "set_volume 1.00"));
        assert_eq!(
            fx.settings.get().alarm_volume(Transition::StandUp),
            100
        );

        fx.controller.set_volume(35).await;
        assert_eq!(fx.settings.get().alarm_volume(Transition::StandUp), 35);
    }

    #[tokio::test]
    async fn volume_change_without_active_alarm_is_ignored() {
        let fx = fixture().await;
        fx.controller.set_volume(10).await;
        assert!(fx.sink.calls().is_empty());
        assert_eq!(fx.settings.get().alarm_volume(Transition::StandUp), 100);
    }

    #[tokio::test]
    async fn blocked_playback_retries_once_on_interaction() {
        let fx = fixture().await;
        fx.sink.fail_next_play.store(true, Ordering::SeqCst);
        fx.controller.announce(Transition::StandUp).await;

        // Prompt still shown despite the silent failure.
        assert_eq!(*fx.prompt_log.lock().unwrap(), vec!["shown StandUp"]);
        assert!(fx.controller.is_active().await);

        fx.controller.user_interaction().await;
        let plays = fx
            .sink
            .calls()
            .iter()
            .filter(|c| c.contains("StandUpChime"))
            .count();
        assert_eq!(plays, 1);

        // The retry is one-shot.
        fx.controller.user_interaction().await;
        let plays_after = fx
            .sink
            .calls()
            .iter()
            .filter(|c| c.contains("StandUpChime"))
            .count();
        assert_eq!(plays_after, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_alert_auto_dismisses() {
        let fx = fixture().await;
        fx.settings
            .update(|s| s.alert_duration = AlertDuration::Fixed(10));

        fx.controller.announce(Transition::StandUp).await;
        assert!(fx.controller.is_active().await);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!fx.controller.is_active().await);
        assert!(fx.prompt_log.lock().unwrap().contains(&"cleared".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn once_alert_dismisses_when_playback_ends() {
        let fx = fixture().await;
        fx.settings.update(|s| s.alert_duration = AlertDuration::Once);

        fx.controller.announce(Transition::SitDown).await;
        assert!(fx.controller.is_active().await);

        fx.sink.finished.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!fx.controller.is_active().await);
    }

    #[tokio::test(start_paused = true)]
    async fn looping_alarm_preempts_before_the_next_alarm() {
        let fx = fixture().await;
        fx.controller.announce(Transition::StandUp).await;
        fx.controller.preempt_in(Duration::from_secs(60)).await;

        tokio::time::sleep(Duration::from_secs(44)).await;
        assert!(fx.controller.is_active().await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!fx.controller.is_active().await);
    }

    #[tokio::test]
    async fn looping_alarm_preempts_immediately_when_next_is_close() {
        let fx = fixture().await;
        fx.controller.announce(Transition::StandUp).await;
        fx.controller.preempt_in(Duration::from_secs(10)).await;
        assert!(!fx.controller.is_active().await);
    }

    #[tokio::test]
    async fn preempt_leaves_non_looping_alarms_alone() {
        let fx = fixture().await;
        fx.settings
            .update(|s| s.alert_duration = AlertDuration::Fixed(30));
        fx.controller.announce(Transition::StandUp).await;
        fx.controller.preempt_in(Duration::from_secs(5)).await;
        assert!(fx.controller.is_active().await);
    }
}
