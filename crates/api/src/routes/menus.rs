//! Menu catalog routes and the rendered menu trees.

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
use foundry_core::access::{Action, MenuNode};
use foundry_db::AccessRepository;
use foundry_db::entities::menus;
use foundry_db::repositories::MenuRepository;
use foundry_shared::types::{ListResponse, MenuInput};

const MENU: &str = "/master/menu";

/// Creates the menu router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/master/menu", get(list_menus).post(create_menu))
        .route(
            "/master/menu/{id}",
            get(get_menu).put(update_menu).delete(delete_menu),
        )
        .route("/master/tree-menu", get(full_tree))
        .route("/master/tree-menu/user", get(user_tree))
}

/// GET /master/menu - List menus that are not deleted.
async fn list_menus(
    State(state): State<AppState>,
    user: AuthUser,
    Page(query): Page,
) -> ApiResult<Json<ListResponse<menus::Model>>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    Ok(Json(
        MenuRepository::new((*state.db).clone()).list(&query).await?,
    ))
}

/// GET /master/menu/{id} - Fetch a menu.
async fn get_menu(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<menus::Model>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    Ok(Json(MenuRepository::new((*state.db).clone()).find(id).await?))
}

/// POST /master/menu - Create a menu.
async fn create_menu(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<MenuInput>,
) -> ApiResult<(StatusCode, Json<menus::Model>)> {
    state.gate(user.user_id(), MENU, Action::Create).await?;
    let menu = MenuRepository::new((*state.db).clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(menu)))
}

/// PUT /master/menu/{id} - Update a menu.
async fn update_menu(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<MenuInput>,
) -> ApiResult<Json<menus::Model>> {
    state.gate(user.user_id(), MENU, Action::Update).await?;
    Ok(Json(
        MenuRepository::new((*state.db).clone())
            .update(id, input)
            .await?,
    ))
}

/// DELETE /master/menu/{id} - Soft-delete a menu and hide its subtree.
async fn delete_menu(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.gate(user.user_id(), MENU, Action::Delete).await?;
    MenuRepository::new((*state.db).clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /master/tree-menu - The whole catalog as a tree.
async fn full_tree(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<MenuNode>>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    Ok(Json(
        AccessRepository::new((*state.db).clone()).full_tree().await?,
    ))
}

/// GET /master/tree-menu/user - The caller's visible tree.
async fn user_tree(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<MenuNode>>> {
    Ok(Json(
        AccessRepository::new((*state.db).clone())
            .user_tree(user.user_id())
            .await?,
    ))
}
