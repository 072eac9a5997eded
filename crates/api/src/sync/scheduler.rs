//! Cron loop driving the employee sync.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local};
use cron::Schedule;
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use foundry_shared::erp::EmployeeSource;

use super::run_sync;

/// Errors starting the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cron expression does not parse.
    #[error("Invalid cron expression {expr:?}: {reason}")]
    InvalidCron {
        /// Expression as configured.
        expr: String,
        /// Parser message.
        reason: String,
    },
}

fn parse(expr: &str) -> Result<Schedule, SchedulerError> {
    Schedule::from_str(expr).map_err(|e| SchedulerError::InvalidCron {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}

/// Next fire time of `expr` after `after`, in local time.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidCron` when `expr` does not parse.
pub fn next_run(expr: &str, after: DateTime<Local>) -> Result<Option<DateTime<Local>>, SchedulerError> {
    Ok(parse(expr)?.after(&after).next())
}

/// Spawns the sync loop.
///
/// A failed run is logged and the loop waits for the next tick. The task
/// stops when `shutdown` changes or its sender is dropped.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidCron` before spawning anything.
pub fn start_sync_scheduler(
    expr: &str,
    db: Arc<DatabaseConnection>,
    source: Arc<dyn EmployeeSource>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<()>, SchedulerError> {
    let schedule = parse(expr)?;
    let expr = expr.to_string();

    Ok(tokio::spawn(async move {
        info!(cron = %expr, "Employee sync scheduler started");

        loop {
            let Some(at) = schedule.upcoming(Local).next() else {
                error!(cron = %expr, "Schedule has no future run");
                break;
            };
            let wait = (at - Local::now()).to_std().unwrap_or_default();
            info!(next_run = %at, "Employee sync scheduled");

            tokio::select! {
                () = tokio::time::sleep(wait) => {
                    if let Err(e) = run_sync(&db, source.as_ref()).await {
                        error!(error = %e, "Employee sync failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Employee sync scheduler shutting down");
                    break;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_default_expression_fires_daily_at_ten_past_five() {
        let after = Local.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let next = next_run("0 10 17 * * *", after).unwrap().unwrap();
        assert_eq!((next.hour(), next.minute(), next.second()), (17, 10, 0));
        assert_eq!(next.date_naive(), after.date_naive());

        let late = Local.with_ymd_and_hms(2026, 3, 2, 18, 0, 0).unwrap();
        let next = next_run("0 10 17 * * *", late).unwrap().unwrap();
        assert_eq!(next.date_naive(), late.date_naive().succ_opt().unwrap());
    }

    #[test]
    fn test_invalid_expression_is_rejected() {
        let err = next_run("every day", Local::now()).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidCron { .. }));
    }
}
