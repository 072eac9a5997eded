//! Manual trigger of the ERP employee sync.

use axum::{Json, Router, extract::State, routing::post};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::sync::run_sync;
use foundry_core::access::Action;
use foundry_db::repositories::SyncReport;

const MENU: &str = "/master/employee";

/// Creates the employee sync router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/master/employee/sync", post(sync_employees))
}

/// POST /master/employee/sync - Run the sync now and report what changed.
async fn sync_employees(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<SyncReport>> {
    state.gate(user.user_id(), MENU, Action::Update).await?;

    let report = run_sync(&state.db, state.erp.as_ref())
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(report))
}
