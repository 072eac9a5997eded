//! Generic CRUD routes for the master-data tables.
//!
//! Each table is served at its menu path, `/master/<entity>` and
//! `/master/<entity>/{id}`, and every handler is gated on that same menu.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::IntoActiveModel;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, Page};
use crate::middleware::auth::AuthUser;
use foundry_core::access::Action;
use foundry_db::MasterRepository;
use foundry_db::entities::master::MasterTable;
use foundry_db::entities::{
    accounts, banks, buildings, currencies, departments, employees, item_categories, item_groups,
    items, machine_revisions, machines, materials, products, reasons, tax_codes, warehouses,
};
use foundry_shared::types::ListResponse;

/// Creates the master-data router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(crud::<accounts::Entity>())
        .merge(crud::<banks::Entity>())
        .merge(crud::<buildings::Entity>())
        .merge(crud::<currencies::Entity>())
        .merge(crud::<departments::Entity>())
        .merge(crud::<employees::Entity>())
        .merge(crud::<item_categories::Entity>())
        .merge(crud::<item_groups::Entity>())
        .merge(crud::<items::Entity>())
        .merge(crud::<machine_revisions::Entity>())
        .merge(crud::<machines::Entity>())
        .merge(crud::<materials::Entity>())
        .merge(crud::<products::Entity>())
        .merge(crud::<reasons::Entity>())
        .merge(crud::<tax_codes::Entity>())
        .merge(crud::<warehouses::Entity>())
}

fn crud<E>() -> Router<AppState>
where
    E: MasterTable + Send + Sync + 'static,
    E::Model: IntoActiveModel<E::ActiveModel> + Serialize + Send + Sync + 'static,
    E::ActiveModel: Send,
{
    Router::new()
        .route(E::MENU_PATH, get(list::<E>).post(create::<E>))
        .route(
            &format!("{}/{{id}}", E::MENU_PATH),
            get(find::<E>).put(update::<E>).delete(remove::<E>),
        )
}

fn repo<E>(state: &AppState) -> MasterRepository<E>
where
    E: MasterTable,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync + 'static,
    E::ActiveModel: Send,
{
    MasterRepository::new((*state.db).clone())
}

/// GET /master/<entity> - List a page of rows.
async fn list<E>(
    State(state): State<AppState>,
    user: AuthUser,
    Page(query): Page,
) -> ApiResult<Json<ListResponse<E::Model>>>
where
    E: MasterTable + Send + Sync + 'static,
    E::Model: IntoActiveModel<E::ActiveModel> + Serialize + Send + Sync + 'static,
    E::ActiveModel: Send,
{
    state.gate(user.user_id(), E::MENU_PATH, Action::View).await?;
    Ok(Json(repo::<E>(&state).list(&query).await?))
}

/// GET /master/<entity>/{id} - Fetch one row.
async fn find<E>(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<E::Model>>
where
    E: MasterTable + Send + Sync + 'static,
    E::Model: IntoActiveModel<E::ActiveModel> + Serialize + Send + Sync + 'static,
    E::ActiveModel: Send,
{
    state.gate(user.user_id(), E::MENU_PATH, Action::View).await?;
    Ok(Json(repo::<E>(&state).find(id).await?))
}

/// POST /master/<entity> - Insert a row, `pending` when a create chain exists.
async fn create<E>(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<E::Input>,
) -> ApiResult<(StatusCode, Json<E::Model>)>
where
    E: MasterTable + Send + Sync + 'static,
    E::Model: IntoActiveModel<E::ActiveModel> + Serialize + Send + Sync + 'static,
    E::ActiveModel: Send,
{
    state.gate(user.user_id(), E::MENU_PATH, Action::Create).await?;
    let model = repo::<E>(&state).create(input, user.user_id()).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

/// PUT /master/<entity>/{id} - Overwrite a row.
async fn update<E>(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ApiJson(input): ApiJson<E::Input>,
) -> ApiResult<Json<E::Model>>
where
    E: MasterTable + Send + Sync + 'static,
    E::Model: IntoActiveModel<E::ActiveModel> + Serialize + Send + Sync + 'static,
    E::ActiveModel: Send,
{
    state.gate(user.user_id(), E::MENU_PATH, Action::Update).await?;
    Ok(Json(
        repo::<E>(&state).update(id, input, user.user_id()).await?,
    ))
}

/// DELETE /master/<entity>/{id} - Remove a row.
async fn remove<E>(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode>
where
    E: MasterTable + Send + Sync + 'static,
    E::Model: IntoActiveModel<E::ActiveModel> + Serialize + Send + Sync + 'static,
    E::ActiveModel: Send,
{
    state.gate(user.user_id(), E::MENU_PATH, Action::Delete).await?;
    repo::<E>(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
