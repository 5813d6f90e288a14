mod settings;

pub use settings::{AlertDuration, Settings, SettingsStore};

use std::path::PathBuf;

/// Returns `~/.config/deskrhythm[-dev]/` based on DESKRHYTHM_ENV.
///
/// Set DESKRHYTHM_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DESKRHYTHM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("deskrhythm-dev")
    } else {
        base_dir.join("deskrhythm")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
