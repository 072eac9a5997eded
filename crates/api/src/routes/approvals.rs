//! Approval chain editing, the approval action and the approval views.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiQuery, ValidatedJson};
use crate::middleware::auth::AuthUser;
use foundry_core::access::Action;
use foundry_core::approval::LevelDraft;
use foundry_db::ApprovalRepository;
use foundry_db::entities::path_for_table;
use foundry_db::repositories::{
    ActInput, ActResult, ApprovalNotification, ApproverInfo, ChainView, HistoryEntry,
    StructureLevel,
};

const MENU: &str = "/approval";

/// Creates the approval router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/approval",
            get(list_chains).post(create_chain).put(replace_chain),
        )
        .route("/approval/{id}", delete(delete_definition))
        .route("/approval/action", post(act))
        .route("/approval/notification", get(notifications))
        .route("/approval-structure", get(structure))
        .route("/approval-history", get(history))
        .route("/approval-user", get(approvers))
}

/// Filter of the chain list.
#[derive(Debug, Deserialize)]
pub struct ChainFilter {
    /// Menu path; all chains when absent.
    pub path: Option<String>,
}

/// Body replacing every chain of one menu.
#[derive(Debug, Deserialize, Validate)]
pub struct ChainRequest {
    /// Menu path the chains belong to.
    #[validate(length(min = 1, message = "path is required"))]
    pub path: String,
    /// All levels of all actions; an empty list removes the chains.
    #[serde(default)]
    pub levels: Vec<LevelDraft>,
}

/// Body of an approval action.
#[derive(Debug, Deserialize, Validate)]
pub struct ActionRequest {
    /// Table of the record.
    #[validate(length(min = 1, message = "ref_table is required"))]
    pub ref_table: String,
    /// Record ID.
    pub ref_id: i32,
    /// Chain to walk, `create` by default.
    #[serde(default = "default_action")]
    pub action: String,
    /// Level the approver means to act on.
    #[serde(default)]
    pub level: Option<i32>,
    /// Comment stored with the history row.
    #[serde(default)]
    pub message: Option<String>,
}

fn default_action() -> String {
    foundry_core::approval::CREATE_ACTION.to_string()
}

/// Query of the structure view.
#[derive(Debug, Deserialize)]
pub struct StructureQuery {
    /// Menu path.
    pub path: String,
}

/// Query of the history view.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Table of the record.
    pub ref_table: String,
    /// Record ID.
    pub ref_id: i32,
}

/// Query of the approver list.
#[derive(Debug, Deserialize)]
pub struct ApproverQuery {
    /// Approval definition ID.
    pub definition_id: i32,
}

/// GET /approval - List chain definitions.
async fn list_chains(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filter): ApiQuery<ChainFilter>,
) -> ApiResult<Json<Vec<ChainView>>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    let chains = ApprovalRepository::new((*state.db).clone())
        .list_chains(filter.path.as_deref())
        .await?;
    Ok(Json(chains))
}

async fn store_chain(
    state: &AppState,
    user: &AuthUser,
    action: Action,
    request: ChainRequest,
) -> ApiResult<Vec<ChainView>> {
    state.gate(user.user_id(), MENU, action).await?;
    Ok(ApprovalRepository::new((*state.db).clone())
        .replace_chain(&request.path, request.levels, user.user_id())
        .await?)
}

/// POST /approval - Define the chains of a menu.
async fn create_chain(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<ChainRequest>,
) -> ApiResult<(StatusCode, Json<Vec<ChainView>>)> {
    let chains = store_chain(&state, &user, Action::Create, request).await?;
    Ok((StatusCode::CREATED, Json(chains)))
}

/// PUT /approval - Replace the chains of a menu.
async fn replace_chain(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<ChainRequest>,
) -> ApiResult<Json<Vec<ChainView>>> {
    Ok(Json(
        store_chain(&state, &user, Action::Update, request).await?,
    ))
}

/// DELETE /approval/{id} - Remove one level; later levels move up.
async fn delete_definition(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.gate(user.user_id(), MENU, Action::Delete).await?;
    ApprovalRepository::new((*state.db).clone())
        .delete_definition(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /approval/action - Approve the next level of a record.
///
/// The record's menu must be visible to the caller, who must also be an
/// eligible approver of the next level.
async fn act(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<ActionRequest>,
) -> ApiResult<Json<ActResult>> {
    if let Some(path) = path_for_table(&request.ref_table) {
        state.gate(user.user_id(), path, Action::View).await?;
    }
    let input = ActInput {
        ref_table: request.ref_table,
        ref_id: request.ref_id,
        action: request.action,
        level: request.level,
        message: request.message,
    };
    let result = ApprovalRepository::new((*state.db).clone())
        .act(input, user.user_id())
        .await?;
    Ok(Json(result))
}

/// GET /approval/notification - Records waiting on the caller.
async fn notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<ApprovalNotification>>> {
    Ok(Json(
        ApprovalRepository::new((*state.db).clone())
            .notifications(user.user_id())
            .await?,
    ))
}

/// GET /approval-structure?path= - Chain levels of a menu as the caller sees them.
async fn structure(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<StructureQuery>,
) -> ApiResult<Json<Vec<StructureLevel>>> {
    state.gate(user.user_id(), &query.path, Action::View).await?;
    Ok(Json(
        ApprovalRepository::new((*state.db).clone())
            .structure(user.user_id(), &query.path)
            .await?,
    ))
}

/// GET /approval-history?ref_table=&ref_id= - Actions taken on a record.
async fn history(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    if let Some(path) = path_for_table(&query.ref_table) {
        state.gate(user.user_id(), path, Action::View).await?;
    }
    Ok(Json(
        ApprovalRepository::new((*state.db).clone())
            .history(&query.ref_table, query.ref_id)
            .await?,
    ))
}

/// GET /approval-user?definition_id= - Approvers of one level.
async fn approvers(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ApproverQuery>,
) -> ApiResult<Json<Vec<ApproverInfo>>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    Ok(Json(
        ApprovalRepository::new((*state.db).clone())
            .approvers(query.definition_id)
            .await?,
    ))
}
