//! Daily background sweeps: demand forecasting, then reorder alerts an hour later by default.

use crate::config::JobsConfig;
use crate::services::{forecasting::ForecastingService, reorder_alerts::ReorderAlertService};
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

/// Time left until the next `hour:00:00` UTC strictly after `now`.
pub fn until_next_run(now: DateTime<Utc>, hour: u32) -> std::time::Duration {
    let at = NaiveTime::from_hms_opt(hour % 24, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date_naive().and_time(at).and_utc();
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}

/// Spawns the forecasting and reorder sweeps. Returns no handles when jobs are disabled.
pub fn start(
    cfg: &JobsConfig,
    forecasting: ForecastingService,
    reorder_alerts: ReorderAlertService,
) -> Vec<JoinHandle<()>> {
    if !cfg.enabled {
        info!("Scheduled jobs disabled");
        return Vec::new();
    }

    let forecast_hour = cfg.forecast_hour;
    let reorder_hour = cfg.reorder_hour;
    info!(forecast_hour, reorder_hour, "Scheduling daily jobs (UTC)");

    let forecast_job = tokio::spawn(async move {
        loop {
            sleep(until_next_run(Utc::now(), forecast_hour)).await;
            match forecasting.run().await {
                Ok(summary) => info!(?summary, "scheduled forecasting finished"),
                Err(e) => error!("scheduled forecasting failed: {}", e),
            }
        }
    });

    let reorder_job = tokio::spawn(async move {
        loop {
            sleep(until_next_run(Utc::now(), reorder_hour)).await;
            match reorder_alerts.run().await {
                Ok(summary) => info!(?summary, "scheduled reorder alerts finished"),
                Err(e) => error!("scheduled reorder alerts failed: {}", e),
            }
        }
    });

    vec![forecast_job, reorder_job]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 0).unwrap();
        assert_eq!(until_next_run(now, 1).as_secs(), 30 * 60);
    }

    #[test]
    fn next_run_rolls_over_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        assert_eq!(until_next_run(now, 2).as_secs(), 24 * 3600);
        let later = Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap();
        assert_eq!(until_next_run(later, 1).as_secs(), 2 * 3600);
    }
}
