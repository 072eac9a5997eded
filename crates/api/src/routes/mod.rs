//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod approvals;
pub mod auth;
pub mod employees;
pub mod health;
pub mod logs;
pub mod master;
pub mod menus;
pub mod permissions;
pub mod roles;
pub mod users;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(master::routes())
        .merge(users::routes())
        .merge(roles::routes())
        .merge(menus::routes())
        .merge(permissions::routes())
        .merge(approvals::routes())
        .merge(logs::routes())
        .merge(employees::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::public_routes())
        .merge(protected_routes)
}
