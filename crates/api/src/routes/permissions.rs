//! Role permission routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::ApiJson;
use crate::middleware::auth::AuthUser;
use foundry_core::access::{Action, MenuNode, PermissionBits};
use foundry_db::AccessRepository;
use foundry_db::entities::role_permissions;
use foundry_db::repositories::PermissionRepository;
use foundry_shared::types::PermissionInput;

const MENU: &str = "/role-permission";

/// Creates the role permission router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/role-permission", post(upsert_permission))
        .route("/role-permission/{role_id}", get(role_tree))
        .route(
            "/role-permission/{role_id}/{menu_id}",
            delete(delete_permission),
        )
}

/// GET /role-permission/{role_id} - The role's menu tree with its bits.
async fn role_tree(
    State(state): State<AppState>,
    user: AuthUser,
    Path(role_id): Path<i32>,
) -> ApiResult<Json<Vec<MenuNode>>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    Ok(Json(
        AccessRepository::new((*state.db).clone())
            .role_tree(role_id)
            .await?,
    ))
}

/// POST /role-permission - Set a role's bits on a menu.
///
/// All bits false removes the row; the response is then `null`.
async fn upsert_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<PermissionInput>,
) -> ApiResult<Json<Option<role_permissions::Model>>> {
    state.gate(user.user_id(), MENU, Action::Update).await?;
    let bits = PermissionBits::new(input.is_create, input.is_update, input.is_delete);
    let row = PermissionRepository::new((*state.db).clone())
        .upsert(input.role_id, input.menu_id, bits)
        .await?;
    Ok(Json(row))
}

/// DELETE /role-permission/{role_id}/{menu_id} - Remove a role's bits on a menu.
async fn delete_permission(
    State(state): State<AppState>,
    user: AuthUser,
    Path((role_id, menu_id)): Path<(i32, i32)>,
) -> ApiResult<StatusCode> {
    state.gate(user.user_id(), MENU, Action::Delete).await?;
    PermissionRepository::new((*state.db).clone())
        .delete(role_id, menu_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
