//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Request extractors
//! - Error responses
//! - The scheduled employee sync

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod sync;
pub mod throttle;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, StatusCode, header::AUTHORIZATION, header::COOKIE};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use foundry_core::access::Action;
use foundry_db::AccessRepository;
use foundry_shared::erp::EmployeeSource;
use foundry_shared::{AppConfig, email::EmailService, jwt::JwtService};

use crate::error::ApiResult;
use crate::throttle::ResetThrottle;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Email service for sending emails.
    pub email_service: Arc<EmailService>,
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Authoritative employee roster.
    pub erp: Arc<dyn EmployeeSource>,
    /// Reset throttle for IDs with no account.
    pub reset_throttle: ResetThrottle,
}

impl AppState {
    /// Passes when `user_id` may perform `action` on the menu at `path`.
    ///
    /// # Errors
    ///
    /// Returns a 403 when the menu is not visible or the bit is missing.
    pub async fn gate(&self, user_id: i32, path: &str, action: Action) -> ApiResult<()> {
        AccessRepository::new((*self.db).clone())
            .gate(user_id, path, action)
            .await?;
        Ok(())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let sensitive: Arc<[HeaderName]> = Arc::new([AUTHORIZATION, COOKIE]);

    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::from_shared(sensitive))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
