//! Activity log routes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ClientInfo, Page};
use crate::middleware::auth::AuthUser;
use foundry_core::access::Action;
use foundry_db::entities::activity_logs;
use foundry_db::repositories::{ActivityLogRepository, NewActivity};
use foundry_shared::types::ListResponse;

const MENU: &str = "/log";

/// Creates the activity log router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/log", get(list_logs).post(record_log))
}

/// Client-reported entry; who and where come from the request.
#[derive(Debug, Deserialize)]
pub struct LogRequest {
    /// What happened.
    pub action: String,
    /// Whether it succeeded.
    #[serde(default = "default_success")]
    pub is_success: bool,
    /// Free text.
    #[serde(default)]
    pub message: Option<String>,
}

const fn default_success() -> bool {
    true
}

/// GET /log - List activity entries.
async fn list_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Page(query): Page,
) -> ApiResult<Json<ListResponse<activity_logs::Model>>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    Ok(Json(
        ActivityLogRepository::new((*state.db).clone())
            .list(&query)
            .await?,
    ))
}

/// POST /log - Append an entry for the caller.
async fn record_log(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
    ApiJson(request): ApiJson<LogRequest>,
) -> ApiResult<(StatusCode, Json<activity_logs::Model>)> {
    let entry = NewActivity {
        user_id: Some(user.user_id()),
        ip: client.ip,
        action: request.action,
        is_success: request.is_success,
        message: request.message,
        user_agent: client.user_agent,
        os: client.os,
    };
    let row = ActivityLogRepository::new((*state.db).clone())
        .record(entry)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}
