//! # deskrhythm Core Library
//!
//! Core logic for deskrhythm, a standing-desk wellness timer. Users run
//! timed sit/stand cycles; finished cycles are scored by a health-ratio
//! algorithm on a points server. The CLI binary is a thin presentation
//! layer over this library.
//!
//! ## Architecture
//!
//! - **Timer**: [`ClockEngine`] is a pure wall-clock state machine that
//!   takes time as a parameter; [`ClockController`] supplies real time and
//!   runs four redundant schedules (ticker, watchdog, forced completion,
//!   early warning) so throttled or suspended hosts cannot stall a phase.
//! - **Alarm**: [`AlarmController`] raises at most one alarm at a time --
//!   a per-transition chime plus a prompt -- and owns its dismissal rules.
//! - **Storage**: TOML settings at `~/.config/deskrhythm/`, durable and
//!   device-local, falling back to defaults on any storage trouble.
//! - **Scoring**: the health-ratio arithmetic the points server applies,
//!   kept here so scores can be previewed offline.
//! - **API**: async client for the points server plus the observer that
//!   submits each completed cycle.
//!
//! State flows outward only through observers ([`ClockObserver`],
//! [`AlarmObserver`]); nothing in here renders anything.

pub mod alarm;
pub mod api;
pub mod error;
pub mod events;
pub mod scoring;
pub mod storage;
pub mod timer;

pub use alarm::{AlarmController, AlarmObserver, AlarmSink, PromptContent, RodioSink};
pub use api::{CompletedCycle, CycleOutcome, PointsClient, PointsRelay, PointsStatus};
pub use error::{ApiError, ConfigError, CoreError, PlaybackError};
pub use events::{ClockObserver, Event};
pub use scoring::{assess_ratio, health_score, score_to_points, HealthScore, PointsTier};
pub use storage::{AlertDuration, Settings, SettingsStore};
pub use timer::{format_clock, ClockController, ClockEngine, Phase, SessionSnapshot, Transition};
