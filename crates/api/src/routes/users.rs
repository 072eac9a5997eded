//! User management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Page, ValidatedJson};
use crate::middleware::auth::AuthUser;
use foundry_core::access::Action;
use foundry_core::auth::{AuthError, hash_password};
use foundry_db::entities::users;
use foundry_db::repositories::UserWithRoles;
use foundry_db::UserRepository;
use foundry_shared::types::{ListResponse, UserInput};

const MENU: &str = "/master/user";

/// Creates the user router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/master/user", get(list_users).post(create_user))
        .route(
            "/master/user/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn hash(password: Option<&str>) -> ApiResult<Option<String>> {
    password
        .map(|plain| hash_password(plain).map_err(|e| ApiError::from(AuthError::from(e))))
        .transpose()
}

/// GET /master/user - List users.
async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Page(query): Page,
) -> ApiResult<Json<ListResponse<users::Model>>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    let page = UserRepository::new((*state.db).clone()).list(&query).await?;
    Ok(Json(page))
}

/// GET /master/user/{id} - Fetch a user with their roles.
async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<UserWithRoles>> {
    state.gate(user.user_id(), MENU, Action::View).await?;
    let found = UserRepository::new((*state.db).clone())
        .find_with_roles(id)
        .await?;
    Ok(Json(found))
}

/// POST /master/user - Create a user; a password is required.
async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<UserInput>,
) -> ApiResult<(StatusCode, Json<UserWithRoles>)> {
    state.gate(user.user_id(), MENU, Action::Create).await?;

    let password_hash = hash(input.password.as_deref())?
        .ok_or_else(|| ApiError::validation("password is required"))?;
    let created = UserRepository::new((*state.db).clone())
        .create(input, password_hash, user.user_id())
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /master/user/{id} - Update a user; an absent password keeps the current one.
async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ValidatedJson(input): ValidatedJson<UserInput>,
) -> ApiResult<Json<UserWithRoles>> {
    state.gate(user.user_id(), MENU, Action::Update).await?;

    let password_hash = hash(input.password.as_deref())?;
    let updated = UserRepository::new((*state.db).clone())
        .update(id, input, password_hash, user.user_id())
        .await?;

    Ok(Json(updated))
}

/// DELETE /master/user/{id} - Delete a user.
async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.gate(user.user_id(), MENU, Action::Delete).await?;
    if id == user.user_id() {
        return Err(ApiError::validation("You cannot delete your own account"));
    }
    UserRepository::new((*state.db).clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
