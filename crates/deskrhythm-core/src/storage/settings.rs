//! TOML-based device-local preferences.
//!
//! Stores the timer and audio preferences:
//! - Sitting/standing phase lengths
//! - Audio alerts on/off and how long an alert plays
//! - Per-transition alarm volumes
//! - First-run gate and last-used stamp
//! - Points server base URL
//!
//! Preferences live at `~/.config/deskrhythm/settings.toml`, separate from
//! anything the points server stores. Unreadable or corrupt files fall
//! back to defaults with a warning; callers never see a storage error.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::Transition;

/// How long an alarm keeps playing once raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertDuration {
    /// Loop until stopped by the user (or pre-empted by the next alarm).
    #[default]
    Loop,
    /// Play the sound once, then dismiss.
    Once,
    /// Play for a fixed number of seconds: 10, 20 or 30.
    Fixed(u32),
}

impl AlertDuration {
    const FIXED_CHOICES: [u32; 3] = [10, 20, 30];

    /// Parse a stored value. Unknown input falls back to `Loop`;
    /// off-menu second counts snap to the nearest choice.
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim() {
            "loop" => AlertDuration::Loop,
            "once" => AlertDuration::Once,
            other => match other.parse::<u32>() {
                Ok(secs) => {
                    let snapped = Self::FIXED_CHOICES
                        .into_iter()
                        .min_by_key(|c| c.abs_diff(secs))
                        .unwrap_or(10);
                    AlertDuration::Fixed(snapped)
                }
                Err(_) => AlertDuration::Loop,
            },
        }
    }
}

impl fmt::Display for AlertDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertDuration::Loop => write!(f, "loop"),
            AlertDuration::Once => write!(f, "once"),
            AlertDuration::Fixed(secs) => write!(f, "{secs}"),
        }
    }
}

impl Serialize for AlertDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AlertDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Err(D::Error::custom("empty alert duration"));
        }
        Ok(AlertDuration::from_str_lossy(&raw))
    }
}

/// Device-local preferences.
///
/// Serialized to/from TOML at `~/.config/deskrhythm/settings.toml`.
/// Every field has a default so partially-written files still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_sitting_minutes")]
    pub sitting_minutes: u32,
    #[serde(default = "default_standing_minutes")]
    pub standing_minutes: u32,
    #[serde(default = "default_true")]
    pub audio_enabled: bool,
    #[serde(default)]
    pub alert_duration: AlertDuration,
    /// Volume for the "time to stand" alarm, 0-100.
    #[serde(default = "default_volume")]
    pub stand_up_volume: u32,
    /// Volume for the "back to sitting" alarm, 0-100.
    #[serde(default = "default_volume")]
    pub sit_down_volume: u32,
    /// True until the user completes the initial setup.
    #[serde(default = "default_true")]
    pub first_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    /// Base URL of the points server.
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

// Default functions
fn default_sitting_minutes() -> u32 {
    20
}
fn default_standing_minutes() -> u32 {
    10
}
fn default_volume() -> u32 {
    100
}
fn default_true() -> bool {
    true
}
fn default_server_url() -> String {
    "http://localhost:8000".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sitting_minutes: default_sitting_minutes(),
            standing_minutes: default_standing_minutes(),
            audio_enabled: true,
            alert_duration: AlertDuration::Loop,
            stand_up_volume: default_volume(),
            sit_down_volume: default_volume(),
            first_run: true,
            last_used: None,
            server_url: default_server_url(),
        }
    }
}

impl Settings {
    /// Saved alarm volume for the given transition.
    pub fn alarm_volume(&self, transition: Transition) -> u32 {
        match transition {
            Transition::StandUp => self.stand_up_volume,
            Transition::SitDown => self.sit_down_volume,
        }
    }

    /// Clamp fields into their valid ranges. Applied on every load and
    /// save so out-of-range values can never reach the timer.
    fn sanitize(&mut self) {
        self.sitting_minutes = self.sitting_minutes.max(1);
        self.standing_minutes = self.standing_minutes.max(1);
        self.stand_up_volume = self.stand_up_volume.min(100);
        self.sit_down_volume = self.sit_down_volume.min(100);
    }

    /// Get a value as string by dot-free key (the settings tree is flat).
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by key, parsing `value` against the field's current
    /// type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be
    /// parsed as the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>().map_err(
                |_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as bool"),
                },
            )?),
            serde_json::Value::Number(_) => {
                let n = value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as number"),
                })?;
                serde_json::Value::Number(n.into())
            }
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(key.to_string(), new_value);

        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.sanitize();
        Ok(())
    }
}

/// Durable store for [`Settings`].
///
/// The public surface never fails: reads fall back to defaults and writes
/// are best-effort with a logged warning, so storage trouble can never
/// stall the timer.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by the default config directory.
    pub fn open() -> Self {
        let path = match data_dir() {
            Ok(dir) => dir.join("settings.toml"),
            Err(err) => {
                warn!("config directory unavailable, using working directory: {err}");
                PathBuf::from("settings.toml")
            }
        };
        Self { path }
    }

    /// Store backed by an explicit file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Current settings merged over defaults. Never partial, never fails.
    pub fn get(&self) -> Settings {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(mut settings) => {
                    settings.sanitize();
                    settings
                }
                Err(err) => {
                    warn!("settings file unreadable, using defaults: {err}");
                    Settings::default()
                }
            },
            Err(_) => Settings::default(),
        }
    }

    /// Validate, stamp `last_used`, and persist. Returns the value that
    /// was written (write failures are logged, not raised).
    pub fn save(&self, mut settings: Settings) -> Settings {
        settings.sanitize();
        settings.last_used = Some(Utc::now());
        match toml::to_string_pretty(&settings) {
            Ok(content) => {
                if let Err(err) = std::fs::write(&self.path, content) {
                    warn!("failed to persist settings to {:?}: {err}", self.path);
                }
            }
            Err(err) => warn!("failed to serialize settings: {err}"),
        }
        settings
    }

    /// Read-modify-write convenience.
    pub fn update(&self, apply: impl FnOnce(&mut Settings)) -> Settings {
        let mut settings = self.get();
        apply(&mut settings);
        self.save(settings)
    }

    /// Flip the first-run gate after initial setup.
    pub fn mark_configured(&self) -> Settings {
        self.update(|s| s.first_run = false)
    }

    /// Persist the alarm volume for one transition, clamped to 0-100.
    pub fn save_alarm_volume(&self, transition: Transition, volume: u32) -> Settings {
        self.update(|s| match transition {
            Transition::StandUp => s.stand_up_volume = volume.min(100),
            Transition::SitDown => s.sit_down_volume = volume.min(100),
        })
    }

    /// Persist new phase lengths.
    pub fn update_times(&self, sitting_minutes: u32, standing_minutes: u32) -> Settings {
        self.update(|s| {
            s.sitting_minutes = sitting_minutes.max(1);
            s.standing_minutes = standing_minutes.max(1);
        })
    }

    /// Clear device-local preferences back to defaults. Points and cycle
    /// history live on the server and are untouched.
    pub fn reset(&self) {
        if self.path.exists() {
            if let Err(err) = std::fs::remove_file(&self.path) {
                warn!("failed to clear settings at {:?}: {err}", self.path);
            }
        }
    }
}
