//! Role management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{Page, ValidatedJson};
use crate::middleware::auth::AuthUser;
use foundry_core::access::Action;
use foundry_db::entities::roles;
use foundry_db::repositories::{RoleRepository, RoleWithMenus};
use foundry_shared::types::{ListResponse, RoleInput};

const MENU: &str = "/master/role";

/// Creates the role router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/master/role", get(list_roles).post(create_role))
        .route(
            "/master/role/{id}",
            get(get_role).put(update_role).delete(delete_role),
        )
}

/// GET /master/role - List roles.
async fn list_roles(
    State(state): State<AppState>,
    user: AuthUser,
    Page(query): Page,
) -> ApiResult<Json<ListResponse<roles::Model>>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    Ok(Json(
        RoleRepository::new((*state.db).clone()).list(&query).await?,
    ))
}

/// GET /master/role/{id} - Fetch a role with its menus.
async fn get_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<RoleWithMenus>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    Ok(Json(RoleRepository::new((*state.db).clone()).find(id).await?))
}

/// POST /master/role - Create a role and its menu set.
async fn create_role(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<RoleInput>,
) -> ApiResult<(StatusCode, Json<RoleWithMenus>)> {
    state.gate(user.user_id(), MENU, Action::Create).await?;
    let role = RoleRepository::new((*state.db).clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// PUT /master/role/{id} - Update a role, replacing its menu set.
async fn update_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<RoleInput>,
) -> ApiResult<Json<RoleWithMenus>> {
    state.gate(user.user_id(), MENU, Action::Update).await?;
    Ok(Json(
        RoleRepository::new((*state.db).clone())
            .update(id, input)
            .await?,
    ))
}

/// DELETE /master/role/{id} - Delete a role.
async fn delete_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.gate(user.user_id(), MENU, Action::Delete).await?;
    RoleRepository::new((*state.db).clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
