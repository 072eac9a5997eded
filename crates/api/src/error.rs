//! HTTP error responses.
//!
//! Every failure leaves the API as `{"error": code, "message": text}` with
//! the status of its kind. Domain errors from the core and db crates convert
//! into [`ApiError`] so handlers can use `?` throughout.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use foundry_core::{access::AccessError, approval::ApprovalError, auth::AuthError};
use foundry_db::MasterError;
use foundry_shared::{AppError, jwt::JwtError};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

/// An error ready to be rendered.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message: message.into(),
        }
    }

    /// 400 with a validation message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(400, "validation", message)
    }

    /// 401 for a missing or revoked credential.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(401, "unauthenticated", message)
    }

    /// 403.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, "forbidden", message)
    }

    /// 404.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, "not_found", message)
    }

    /// 500; the detail is logged, never sent.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "Request failed");
        Self::new(500, "internal", "An internal error occurred")
    }

    /// The HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn from_kind(status: u16, code: &'static str, message: String) -> Self {
        if status >= 500 {
            Self::internal(message)
        } else {
            Self::new(status, code, message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::from_kind(err.status_code(), err.error_code(), err.message().to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::from_kind(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        Self::from_kind(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<ApprovalError> for ApiError {
    fn from(err: ApprovalError) -> Self {
        Self::from_kind(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<MasterError> for ApiError {
    fn from(err: MasterError) -> Self {
        Self::from_kind(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::internal(err)
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::unauthenticated("Token has expired"),
            JwtError::Invalid | JwtError::DecodingError(_) => {
                Self::unauthenticated("Invalid or malformed token")
            }
            JwtError::EncodingError(_) => Self::internal(err),
        }
    }
}
