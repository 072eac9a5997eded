//! Authentication types for JWT and tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Which of the two token kinds a JWT represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived bearer token.
    Access,
    /// Long-lived token exchanged for new access tokens.
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i32,
    /// Username at issue time.
    pub username: String,
    /// Login session the token belongs to.
    pub sid: String,
    /// Token kind.
    pub typ: TokenType,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user session.
    #[must_use]
    pub fn new(
        user_id: i32,
        username: &str,
        session_id: &str,
        typ: TokenType,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            username: username.to_string(),
            sid: session_id.to_string(),
            typ,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.sub
    }

    /// Returns the session ID from claims.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.sid
    }
}

/// Token pair returned after successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived).
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

impl TokenPair {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
        }
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    /// Plain password.
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Login response payload.
///
/// When the account has a second factor enabled, no tokens are issued and
/// `requires_two_factor` is set; the client continues with `POST /two-fa`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Refresh token, also set as an HTTP-only cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Access token expiration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Whether a TOTP code is still needed.
    pub requires_two_factor: bool,
}

impl LoginResponse {
    /// Response for a completed login.
    #[must_use]
    pub fn authenticated(tokens: TokenPair) -> Self {
        Self {
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            expires_in: Some(tokens.expires_in),
            requires_two_factor: false,
        }
    }

    /// Response for a login waiting on the second factor.
    #[must_use]
    pub const fn two_factor_pending() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            expires_in: None,
            requires_two_factor: true,
        }
    }
}

/// Second-factor verification payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TwoFactorVerifyRequest {
    /// Username from the preceding login.
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    /// Six-digit TOTP code.
    #[validate(length(equal = 6, message = "otp must be 6 digits"))]
    pub otp: String,
}

/// Refresh token request for clients that cannot hold cookies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    pub refresh_token: Option<String>,
}

/// Access token returned by the refresh endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenResponse {
    /// New access token.
    pub access_token: String,
    /// Expiration in seconds.
    pub expires_in: i64,
}

/// Change password payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
    /// New password.
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

/// Toggle second factor payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SetTwoFactorRequest {
    /// Desired state.
    pub enabled: bool,
}

/// Result of toggling the second factor.
#[derive(Debug, Clone, Serialize)]
pub struct SetTwoFactorResponse {
    /// Current state.
    pub is_two_factor_enabled: bool,
    /// `otpauth://` provisioning URL, present only when enabling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_url: Option<String>,
}

/// Redeem a password-reset token.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetRequest {
    /// Token from the reset email.
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    /// New password.
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Department summary embedded in user info.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentInfo {
    /// Department ID.
    pub id: i32,
    /// Department code.
    pub code: String,
    /// Department name.
    pub name: String,
}

/// Caller profile. Credentials are never included.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: i32,
    /// Username.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: Option<String>,
    /// Whether a second factor is enabled.
    pub is_two_factor_enabled: bool,
    /// Department, if assigned.
    pub department: Option<DepartmentInfo>,
    /// Role names.
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_accessors() {
        let claims = Claims::new(
            7,
            "alice",
            "sess",
            TokenType::Access,
            Utc::now() + Duration::minutes(5),
        );
        assert_eq!(claims.user_id(), 7);
        assert_eq!(claims.session_id(), "sess");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_type_serialization() {
        assert_eq!(
            serde_json::to_string(&TokenType::Refresh).unwrap(),
            "\"refresh\""
        );
    }

    #[test]
    fn test_two_factor_pending_response_has_no_tokens() {
        let json = serde_json::to_value(LoginResponse::two_factor_pending()).unwrap();
        assert_eq!(json["requires_two_factor"], true);
        assert!(json.get("access_token").is_none());
        assert!(json.get("refresh_token").is_none());
    }

    #[test]
    fn test_login_request_validation() {
        let empty = LoginRequest {
            username: String::new(),
            password: "x".into(),
        };
        assert!(empty.validate().is_err());

        let short = ChangePasswordRequest {
            current_password: "old".into(),
            new_password: "short".into(),
        };
        assert!(short.validate().is_err());
    }
}
