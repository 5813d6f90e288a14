//! The `run` command: composition root for the terminal timer.
//!
//! Everything is wired here -- settings store, engine, alarm, observers --
//! and nowhere else. The core library renders nothing; the two observer
//! implementations in this file are the entire presentation layer.

use std::io::Write as _;
use std::sync::Arc;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use deskrhythm_core::scoring::DAILY_POINT_CAP;
use deskrhythm_core::{
    format_clock, AlarmController, AlarmObserver, ClockController, ClockEngine, ClockObserver,
    Phase, PointsClient, PointsRelay, PromptContent, RodioSink, SettingsStore,
};

#[derive(Args)]
pub struct RunArgs {
    /// Do not submit completed cycles to the points server
    #[arg(long)]
    pub offline: bool,
    /// Server base URL override
    #[arg(long)]
    pub server: Option<String>,
}

/// Prints the countdown in place on one terminal line.
#[derive(Default)]
struct TerminalDisplay;

impl ClockObserver for TerminalDisplay {
    fn on_tick(&mut self, remaining_secs: u64, phase: Phase) {
        let label = match phase {
            Phase::Sitting => "sitting",
            Phase::Standing => "standing",
        };
        print!("\r{label:>8}  {}   ", format_clock(remaining_secs));
        let _ = std::io::stdout().flush();
    }

    fn on_phase_change(&mut self, phase: Phase) {
        println!();
        match phase {
            Phase::Standing => println!("-- stand up and stretch --"),
            Phase::Sitting => println!("-- back to focused work --"),
        }
    }
}

/// Renders the alarm prompt as terminal lines.
struct PromptPrinter;

impl AlarmObserver for PromptPrinter {
    fn on_prompt_shown(&mut self, prompt: &PromptContent) {
        println!();
        println!("*** {} ***", prompt.title);
        println!("    {}", prompt.message);
        println!("    [Enter] {}   [v <0-100>] volume (now {})",
            prompt.button_label, prompt.volume);
    }

    fn on_prompt_cleared(&mut self) {
        println!();
        println!("(alarm stopped)");
    }
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(SettingsStore::open());
    let settings = store.get();
    if settings.first_run {
        return Err(
            "timer not set up yet -- run `deskrhythm-cli config init --sitting 20 --standing 10` first"
                .into(),
        );
    }

    let alarm = AlarmController::new(Arc::new(RodioSink::new()), store.clone());
    alarm.add_observer(Box::new(PromptPrinter)).await;

    let engine = ClockEngine::new(settings.sitting_minutes, settings.standing_minutes);
    let controller = ClockController::new(engine, alarm.clone());
    controller
        .add_observer(Box::new(TerminalDisplay::default()))
        .await;

    if !args.offline {
        let base = args
            .server
            .clone()
            .unwrap_or_else(|| settings.server_url.clone());
        match PointsClient::new(&base) {
            Ok(client) => {
                let (relay, mut outcomes) = PointsRelay::new(Arc::new(client), store.clone());
                controller.add_observer(Box::new(relay)).await;
                tokio::spawn(async move {
                    while let Some(outcome) = outcomes.recv().await {
                        println!();
                        println!(
                            "cycle complete: score {}/100, +{} points ({}/{} today, {} total)",
                            outcome.health_score,
                            outcome.points_earned,
                            outcome.daily_points,
                            DAILY_POINT_CAP,
                            outcome.total_points
                        );
                        if !outcome.feedback.is_empty() {
                            println!("  {}", outcome.feedback);
                        }
                        if outcome.daily_limit_reached {
                            println!("  daily limit reached -- come back tomorrow");
                        }
                    }
                });
            }
            Err(err) => warn!("points submission disabled: {err}"),
        }
    }

    println!(
        "deskrhythm: {} min sitting / {} min standing",
        settings.sitting_minutes, settings.standing_minutes
    );
    println!("[Enter] stop alarm  [p] pause  [r] resume  [s] reset  [v <0-100>] alarm volume  [q] quit");
    controller.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                // Catch up first: if the process was suspended (ctrl-z,
                // laptop sleep), any overdue completion lands now.
                controller.resync().await;
                match line.trim() {
                    "" => alarm.cleanup().await,
                    "p" => {
                        alarm.user_interaction().await;
                        controller.pause().await;
                    }
                    "r" => {
                        alarm.user_interaction().await;
                        controller.start().await;
                    }
                    "s" => {
                        alarm.user_interaction().await;
                        controller.stop().await;
                    }
                    "q" => break,
                    other => {
                        if let Some(volume) = other
                            .strip_prefix("v ")
                            .and_then(|v| v.trim().parse::<u32>().ok())
                        {
                            alarm.user_interaction().await;
                            alarm.set_volume(volume).await;
                        } else {
                            println!("commands: Enter, p, r, s, v <0-100>, q");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.pause().await;
    alarm.cleanup().await;
    println!();
    Ok(())
}
