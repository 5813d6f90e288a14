use clap::Subcommand;
use deskrhythm_core::scoring::assess_ratio;
use deskrhythm_core::{AlertDuration, SettingsStore, Transition};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Initial setup: phase lengths and audio preferences
    Init {
        /// Sitting minutes (20 recommended)
        #[arg(long)]
        sitting: u32,
        /// Standing minutes (10 recommended)
        #[arg(long)]
        standing: u32,
        /// Disable audio alerts entirely
        #[arg(long)]
        no_audio: bool,
        /// How long an alarm plays: loop, once, 10, 20 or 30
        #[arg(long)]
        alert: Option<String>,
    },
    /// Get a settings value
    Get {
        /// Settings key (e.g. "sitting_minutes", "audio_enabled")
        key: String,
    },
    /// Set a settings value
    Set {
        /// Settings key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings values
    List,
    /// Save the alarm volume for one transition
    Volume {
        /// "stand-up" or "sit-down"
        transition: String,
        /// Volume 0-100
        volume: u32,
    },
    /// Reset device settings to defaults (server-side points are kept)
    Reset,
}

fn parse_transition(value: &str) -> Result<Transition, Box<dyn std::error::Error>> {
    match value {
        "stand-up" | "standup" | "stand_up" => Ok(Transition::StandUp),
        "sit-down" | "sitdown" | "sit_down" => Ok(Transition::SitDown),
        other => Err(format!("unknown transition '{other}' (use stand-up or sit-down)").into()),
    }
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SettingsStore::open();
    match action {
        ConfigAction::Init {
            sitting,
            standing,
            no_audio,
            alert,
        } => {
            let saved = store.update(|s| {
                s.sitting_minutes = sitting.max(1);
                s.standing_minutes = standing.max(1);
                s.audio_enabled = !no_audio;
                if let Some(ref alert) = alert {
                    s.alert_duration = AlertDuration::from_str_lossy(alert);
                }
                s.first_run = false;
            });
            println!(
                "configured: {} min sitting / {} min standing, audio {}",
                saved.sitting_minutes,
                saved.standing_minutes,
                if saved.audio_enabled { "on" } else { "off" }
            );
            let ratio = assess_ratio(saved.sitting_minutes, saved.standing_minutes);
            println!("{}", ratio.recommendation);
        }
        ConfigAction::Get { key } => {
            let settings = store.get();
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut settings = store.get();
            settings.set(&key, &value)?;
            store.save(settings);
            println!("ok");
        }
        ConfigAction::List => {
            let settings = store.get();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Volume { transition, volume } => {
            let transition = parse_transition(&transition)?;
            let saved = store.save_alarm_volume(transition, volume);
            println!("{} volume: {}",
                match transition {
                    Transition::StandUp => "stand-up",
                    Transition::SitDown => "sit-down",
                },
                saved.alarm_volume(transition)
            );
        }
        ConfigAction::Reset => {
            store.reset();
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
