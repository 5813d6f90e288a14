//! Alarm playback backend.
//!
//! rodio's output types are not `Send`, so the real backend parks them on
//! a dedicated audio thread driven by a command channel. Everything above
//! talks to the [`AlarmSink`] trait, which also gives tests a seam.

use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::PlaybackError;
use crate::timer::Transition;

const SAMPLE_RATE: u32 = 44100;
const BEEP_SECS: f32 = 0.28;
const FADE_SECS: f32 = 0.02;
const CHIME_TOTAL_SECS: f32 = 1.6;

/// The two alarm chimes: a rising figure for "stand up", a falling one
/// for "back to sitting".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSound {
    StandUpChime,
    SitDownChime,
}

impl AlarmSound {
    pub fn for_transition(transition: Transition) -> Self {
        match transition {
            Transition::StandUp => AlarmSound::StandUpChime,
            Transition::SitDown => AlarmSound::SitDownChime,
        }
    }

    /// Beep onsets as (frequency Hz, start second).
    fn pattern(self) -> [(f32, f32); 3] {
        match self {
            // E5 -> G5 -> B5
            AlarmSound::StandUpChime => [(659.25, 0.0), (783.99, 0.35), (987.77, 0.7)],
            // B5 -> G5 -> E5
            AlarmSound::SitDownChime => [(987.77, 0.0), (783.99, 0.35), (659.25, 0.7)],
        }
    }
}

/// Synthesized chime, a finite mono source.
pub struct ChimeTone {
    sound: AlarmSound,
    position: usize,
    total_samples: usize,
}

impl ChimeTone {
    pub fn new(sound: AlarmSound) -> Self {
        Self {
            sound,
            position: 0,
            total_samples: (CHIME_TOTAL_SECS * SAMPLE_RATE as f32) as usize,
        }
    }
}

impl Iterator for ChimeTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.total_samples {
            return None;
        }
        let t = self.position as f32 / SAMPLE_RATE as f32;
        self.position += 1;

        let mut sample = 0.0;
        for (freq, start) in self.sound.pattern() {
            let local = t - start;
            if (0.0..BEEP_SECS).contains(&local) {
                // Short fades keep the beep edges from clicking.
                let fade_in = (local / FADE_SECS).min(1.0);
                let fade_out = ((BEEP_SECS - local) / FADE_SECS).min(1.0);
                sample +=
                    (2.0 * std::f32::consts::PI * freq * local).sin() * fade_in * fade_out;
            }
        }
        Some(sample * 0.2)
    }
}

impl Source for ChimeTone {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.position)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(CHIME_TOTAL_SECS))
    }
}

/// Seam between the alarm lifecycle and actual audio output.
///
/// `play` reports failure synchronously so the caller can degrade to a
/// silent prompt and arm a retry; the other operations are best-effort.
pub trait AlarmSink: Send + Sync {
    fn play(&self, sound: AlarmSound, looped: bool, volume: f32) -> Result<(), PlaybackError>;
    fn set_volume(&self, volume: f32);
    fn stop(&self);
    /// Whether a non-looping playback has run to its natural end.
    fn is_finished(&self) -> bool;
}

enum SinkCommand {
    Play {
        sound: AlarmSound,
        looped: bool,
        volume: f32,
        done: Sender<Result<(), String>>,
    },
    SetVolume(f32),
    Stop,
}

/// rodio-backed [`AlarmSink`].
pub struct RodioSink {
    tx: Mutex<Option<Sender<SinkCommand>>>,
    finished: Arc<AtomicBool>,
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioSink {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
            finished: Arc::new(AtomicBool::new(true)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<SinkCommand>, PlaybackError> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|e| PlaybackError::BackendStopped(e.to_string()))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<SinkCommand>();
        let finished = Arc::clone(&self.finished);

        thread::Builder::new()
            .name("alarm-audio".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<(), String> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .map_err(|e| format!("failed to open audio output: {e}"))?;
                        let new_sink = Sink::try_new(&handle)
                            .map_err(|e| format!("failed to create audio sink: {e}"))?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                loop {
                    match rx.recv_timeout(Duration::from_millis(200)) {
                        Ok(SinkCommand::Play {
                            sound,
                            looped,
                            volume,
                            done,
                        }) => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            _stream = None;
                            let result = ensure_sink(&mut _stream, &mut sink);
                            if result.is_ok() {
                                if let Some(s) = sink.as_ref() {
                                    s.set_volume(volume.clamp(0.0, 1.0));
                                    if looped {
                                        s.append(ChimeTone::new(sound).repeat_infinite());
                                    } else {
                                        s.append(ChimeTone::new(sound));
                                    }
                                    finished.store(false, Ordering::SeqCst);
                                }
                            }
                            let _ = done.send(result);
                        }
                        Ok(SinkCommand::SetVolume(v)) => {
                            if let Some(ref s) = sink {
                                s.set_volume(v.clamp(0.0, 1.0));
                            }
                        }
                        Ok(SinkCommand::Stop) => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            _stream = None;
                            finished.store(true, Ordering::SeqCst);
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            if let Some(ref s) = sink {
                                if s.empty() {
                                    finished.store(true, Ordering::SeqCst);
                                }
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| PlaybackError::BackendStopped(e.to_string()))?;

        let tx_clone = tx.clone();
        *guard = Some(tx);
        Ok(tx_clone)
    }
}

impl AlarmSink for RodioSink {
    fn play(&self, sound: AlarmSound, looped: bool, volume: f32) -> Result<(), PlaybackError> {
        let tx = self.ensure_thread()?;
        let (done_tx, done_rx) = mpsc::channel();
        tx.send(SinkCommand::Play {
            sound,
            looped,
            volume,
            done: done_tx,
        })
        .map_err(|e| PlaybackError::BackendStopped(e.to_string()))?;

        match done_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(PlaybackError::OutputUnavailable(message)),
            Err(e) => Err(PlaybackError::BackendStopped(e.to_string())),
        }
    }

    fn set_volume(&self, volume: f32) {
        if let Ok(tx) = self.ensure_thread() {
            let _ = tx.send(SinkCommand::SetVolume(volume));
        }
    }

    fn stop(&self) {
        if let Ok(Some(tx)) = self.tx.lock().map(|g| g.clone()) {
            let _ = tx.send(SinkCommand::Stop);
        }
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chime_is_finite_and_bounded() {
        let samples: Vec<f32> = ChimeTone::new(AlarmSound::StandUpChime).collect();
        assert_eq!(samples.len(), (CHIME_TOTAL_SECS * SAMPLE_RATE as f32) as usize);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        // The chime actually contains sound, not just silence.
        assert!(samples.iter().any(|s| s.abs() > 0.05));
    }

    #[test]
    fn chimes_differ_per_transition() {
        let up: Vec<f32> = ChimeTone::new(AlarmSound::StandUpChime).take(4000).collect();
        let down: Vec<f32> = ChimeTone::new(AlarmSound::SitDownChime).take(4000).collect();
        assert_ne!(up, down);
    }

    #[test]
    fn sound_selection_by_transition() {
        assert_eq!(
            AlarmSound::for_transition(Transition::StandUp),
            AlarmSound::StandUpChime
        );
        assert_eq!(
            AlarmSound::for_transition(Transition::SitDown),
            AlarmSound::SitDownChime
        );
    }
}
