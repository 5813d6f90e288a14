//! Core error types for deskrhythm-core.
//!
//! Most failures in this library are absorbed where they occur (settings
//! fall back to defaults, playback degrades to silent, timing drift is
//! self-healed). The types here cover the boundaries that do report
//! errors: configuration editing, audio output, and the points API.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for deskrhythm-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Audio playback errors
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Points API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to save settings
    #[error("Failed to save settings to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid value for a settings key
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown settings key
    #[error("Unknown settings key: {0}")]
    UnknownKey(String),
}

/// Audio-playback-specific errors.
///
/// These never escape the alarm subsystem -- a failed playback degrades to
/// a silent prompt with a retry armed on the next user interaction.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// No usable audio output device
    #[error("Audio output unavailable: {0}")]
    OutputUnavailable(String),

    /// The audio thread is gone
    #[error("Audio backend stopped: {0}")]
    BackendStopped(String),
}

/// Points-API-specific errors.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The configured server URL cannot be parsed
    #[error("Invalid server URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned HTTP {status}")]
    Status { status: u16 },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
