//! Points server boundary.
//!
//! The timer never talks to the server; it only raises `CycleCompleted`.
//! [`PointsRelay`] is the one observer that crosses this boundary: it
//! submits the finished cycle for scoring and forwards the server's
//! verdict for display. A missing or unreachable server degrades to a
//! logged warning -- the timer keeps running regardless.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;
use url::Url;

use crate::error::ApiError;
use crate::events::ClockObserver;
use crate::storage::SettingsStore;

/// A finished sit+stand cycle, as submitted for scoring.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedCycle {
    pub sitting_minutes: u32,
    pub standing_minutes: u32,
    pub cycle_number: u32,
    /// The user's local calendar date, so day boundaries follow the desk,
    /// not the server.
    pub user_date: NaiveDate,
}

/// The server's verdict on a submitted cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct CycleOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub health_score: u8,
    pub points_earned: u32,
    pub daily_points: u32,
    pub total_points: u32,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub daily_limit_reached: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointsStatus {
    pub total_points: u32,
    pub daily_points: u32,
    #[serde(default)]
    pub todays_cycles: u32,
}

/// Async client for the points server.
#[derive(Debug, Clone)]
pub struct PointsClient {
    base: Url,
    client: reqwest::Client,
}

impl PointsClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|source| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            base,
            client: reqwest::Client::new(),
        })
    }

    /// Submit a finished cycle for scoring.
    pub async fn complete_cycle(&self, cycle: &CompletedCycle) -> Result<CycleOutcome, ApiError> {
        let mut url = self.base.clone();
        url.set_path("/api/health-cycle/complete");
        let resp = self.client.post(url).json(cycle).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status {
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    /// Current points and cycle count for the given local date.
    pub async fn points_status(&self, user_date: NaiveDate) -> Result<PointsStatus, ApiError> {
        let mut url = self.base.clone();
        url.set_path("/api/health-cycle/points-status");
        url.query_pairs_mut()
            .append_pair("user_date", &user_date.to_string());
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status {
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }
}

/// Observer that submits each completed cycle to the points server.
///
/// Outcomes arrive on the paired receiver; submission failures are logged
/// and swallowed so an offline server never disturbs the timer.
pub struct PointsRelay {
    client: Arc<PointsClient>,
    settings: Arc<SettingsStore>,
    updates: UnboundedSender<CycleOutcome>,
}

impl PointsRelay {
    pub fn new(
        client: Arc<PointsClient>,
        settings: Arc<SettingsStore>,
    ) -> (Self, UnboundedReceiver<CycleOutcome>) {
        let (updates, rx) = mpsc::unbounded_channel();
        (
            Self {
                client,
                settings,
                updates,
            },
            rx,
        )
    }
}

impl ClockObserver for PointsRelay {
    fn on_cycle_complete(&mut self) {
        let client = self.client.clone();
        let settings = self.settings.get();
        let updates = self.updates.clone();
        tokio::spawn(async move {
            let today = Local::now().date_naive();
            // The server holds the authoritative cycle count; fall back to
            // 1 when it cannot be asked.
            let cycle_number = match client.points_status(today).await {
                Ok(status) => status.todays_cycles + 1,
                Err(_) => 1,
            };
            let cycle = CompletedCycle {
                sitting_minutes: settings.sitting_minutes,
                standing_minutes: settings.standing_minutes,
                cycle_number,
                user_date: today,
            };
            match client.complete_cycle(&cycle).await {
                Ok(outcome) => {
                    let _ = updates.send(outcome);
                }
                Err(err) => warn!("points submission unavailable: {err}"),
            }
        });
    }
}
