//! Authentication rules.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - TOTP enrollment and verification
//! - The error vocabulary of the authentication gateway

mod password;
pub mod totp;

pub use password::{PasswordError, hash_password, verify_dummy, verify_password};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by login, session and password flows.
///
/// `InvalidCredentials` and `BadOtp` render identically to clients so a
/// caller cannot tell which factor failed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Wrong, stale or unrequested one-time code.
    #[error("Invalid credentials")]
    BadOtp,

    /// Account is disabled.
    #[error("Account is inactive")]
    InactiveAccount,

    /// Missing, malformed, expired or revoked token.
    #[error("{0}")]
    Unauthenticated(String),

    /// Current password did not match on change.
    #[error("Current password is incorrect")]
    CurrentPasswordMismatch,

    /// Reset token unknown.
    #[error("Invalid password reset token")]
    InvalidToken,

    /// Reset token past its expiry.
    #[error("Password reset token has expired")]
    ExpiredToken,

    /// Reset token already redeemed.
    #[error("Password reset token has already been used")]
    AlreadyUsed,

    /// Reset requested again inside the throttle window.
    #[error("Password reset was requested recently, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until a new request is accepted.
        retry_after_secs: i64,
    },

    /// User not found by id.
    #[error("User {0} not found")]
    UserNotFound(i32),

    /// Hashing failure.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// TOTP secret could not be generated or parsed.
    #[error("TOTP error: {0}")]
    Totp(String),

    /// Token signing failure.
    #[error("Token error: {0}")]
    Token(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials
            | Self::BadOtp
            | Self::InactiveAccount
            | Self::Unauthenticated(_) => 401,
            Self::CurrentPasswordMismatch | Self::InvalidToken | Self::ExpiredToken => 400,
            Self::UserNotFound(_) => 404,
            Self::AlreadyUsed => 409,
            Self::RateLimited { .. } => 429,
            Self::Password(_) | Self::Totp(_) | Self::Token(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials | Self::BadOtp => "invalid_credentials",
            Self::InactiveAccount => "inactive_account",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::CurrentPasswordMismatch => "validation",
            Self::InvalidToken => "invalid_token",
            Self::ExpiredToken => "expired_token",
            Self::AlreadyUsed => "already_used",
            Self::RateLimited { .. } => "rate_limited",
            Self::UserNotFound(_) => "not_found",
            Self::Password(_) | Self::Totp(_) | Self::Token(_) | Self::Database(_) => "internal",
        }
    }

    /// Whether the failure should be written to the activity log as a failed login.
    #[must_use]
    pub const fn is_failed_login(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::BadOtp | Self::InactiveAccount
        )
    }
}

/// State of a single password-reset token at redemption time.
#[derive(Debug, Clone, Copy)]
pub struct ResetTokenState {
    /// Whether it was already redeemed.
    pub is_used: bool,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Decides whether a reset token may be redeemed at `now`.
///
/// # Errors
///
/// `AlreadyUsed` for a redeemed token, `ExpiredToken` at or after expiry.
pub fn check_reset_token(state: ResetTokenState, now: DateTime<Utc>) -> Result<(), AuthError> {
    if state.is_used {
        return Err(AuthError::AlreadyUsed);
    }
    if now >= state.expires_at {
        return Err(AuthError::ExpiredToken);
    }
    Ok(())
}

/// Decides whether a new reset may be issued given the latest one.
///
/// # Errors
///
/// `RateLimited` when the previous request is younger than `throttle_secs`.
pub fn check_reset_throttle(
    last_requested_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    throttle_secs: i64,
) -> Result<(), AuthError> {
    if let Some(last) = last_requested_at {
        let elapsed = (now - last).num_seconds();
        if elapsed < throttle_secs {
            return Err(AuthError::RateLimited {
                retry_after_secs: throttle_secs - elapsed,
            });
        }
    }
    Ok(())
}
