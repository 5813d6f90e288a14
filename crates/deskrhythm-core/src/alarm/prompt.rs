//! On-screen prompt content for a raised alarm.
//!
//! The alarm subsystem owns the prompt *state*; whatever renders it (a
//! terminal line, a desktop dialog) subscribes through `AlarmObserver`.

use serde::Serialize;

use crate::storage::{AlertDuration, Settings};
use crate::timer::Transition;

#[derive(Debug, Clone, Serialize)]
pub struct PromptContent {
    pub transition: Transition,
    pub title: &'static str,
    pub message: String,
    pub button_label: &'static str,
    /// Volume the alarm is currently playing at, 0-100.
    pub volume: u32,
}

impl PromptContent {
    pub fn for_transition(transition: Transition, settings: &Settings) -> Self {
        let duration_info = match settings.alert_duration {
            AlertDuration::Loop => String::new(),
            AlertDuration::Once => " (alarm plays once)".to_string(),
            AlertDuration::Fixed(secs) => format!(" (alarm plays for {secs} seconds)"),
        };

        match transition {
            Transition::StandUp => Self {
                transition,
                title: "Stand up break!",
                message: format!(
                    "{}-minute break to stretch and move around{duration_info}",
                    settings.standing_minutes
                ),
                button_label: "Stop alarm",
                volume: settings.alarm_volume(transition),
            },
            Transition::SitDown => Self {
                transition,
                title: "Back to work",
                message: format!(
                    "Time for {} minutes of focused work{duration_info}",
                    settings.sitting_minutes
                ),
                button_label: "Stop alarm",
                volume: settings.alarm_volume(transition),
            },
        }
    }
}
