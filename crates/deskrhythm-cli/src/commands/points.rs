use chrono::Local;
use clap::Subcommand;
use deskrhythm_core::scoring::DAILY_POINT_CAP;
use deskrhythm_core::{PointsClient, SettingsStore};

#[derive(Subcommand)]
pub enum PointsAction {
    /// Today's points and cycle count
    Status {
        /// Server base URL (defaults to the configured one)
        #[arg(long)]
        server: Option<String>,
    },
}

pub async fn run(action: PointsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PointsAction::Status { server } => {
            let settings = SettingsStore::open().get();
            let base = server.unwrap_or(settings.server_url);
            let client = PointsClient::new(&base)?;
            let status = client.points_status(Local::now().date_naive()).await?;
            println!("Total points: {}", status.total_points);
            println!(
                "Today: {}/{} points over {} cycles",
                status.daily_points, DAILY_POINT_CAP, status.todays_cycles
            );
        }
    }
    Ok(())
}
