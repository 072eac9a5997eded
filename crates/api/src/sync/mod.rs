//! Employee roster sync from the ERP.
//!
//! One run fetches the remote roster, plans the writes against the local
//! table and applies them in a single transaction. The scheduler runs it
//! on a cron expression; `POST /master/employee/sync` runs it on demand.

mod scheduler;

pub use scheduler::{SchedulerError, next_run, start_sync_scheduler};

use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::info;

use foundry_core::sync::plan;
use foundry_db::repositories::{EmployeeRepository, SyncReport};
use foundry_shared::erp::{EmployeeSource, ErpError};

/// Why a sync run failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The ERP could not be read.
    #[error(transparent)]
    Source(#[from] ErpError),
    /// Local read or write failed; nothing was applied.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Runs one sync.
///
/// # Errors
///
/// Returns `SyncError` when the ERP or the database fails.
pub async fn run_sync(
    db: &DatabaseConnection,
    source: &dyn EmployeeSource,
) -> Result<SyncReport, SyncError> {
    let remote = source.fetch_employees().await?;
    let repo = EmployeeRepository::new(db.clone());
    let local = repo.load_local().await?;

    let report = repo.apply_plan(plan(&local, &remote)).await?;
    info!(
        remote = remote.len(),
        inserted = report.inserted,
        updated = report.updated,
        deactivated = report.deactivated,
        skipped = report.skipped,
        "Employee sync finished"
    );
    Ok(report)
}
