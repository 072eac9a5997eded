//! Authentication routes: login, second factor, tokens and passwords.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ClientInfo, ValidatedJson};
use crate::middleware::auth::AuthUser;
use foundry_core::access::Action;
use foundry_core::auth::{AuthError, hash_password, totp, verify_dummy, verify_password};
use foundry_db::entities::users;
use foundry_db::repositories::{
    AccessRepository, ActivityLogRepository, NewActivity, PasswordResetRepository,
};
use foundry_db::UserRepository;
use foundry_shared::auth::{
    AccessTokenResponse, ChangePasswordRequest, DepartmentInfo, LoginRequest, LoginResponse,
    MessageResponse, PasswordResetRequest, RefreshRequest, SetTwoFactorRequest,
    SetTwoFactorResponse, TokenPair, TokenType, TwoFactorVerifyRequest, UserInfo,
};

/// Cookie carrying the refresh token for browser clients.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Menu whose update bit lets an operator manage other users' credentials.
const USER_MENU: &str = "/master/user";

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/two-fa", post(verify_two_factor))
        .route("/token", get(refresh))
        .route("/password-reset", post(password_reset))
}

/// Routes for an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", delete(logout))
        .route("/user-info", get(user_info))
        .route("/change-password", put(change_password))
        .route("/{id}/two-fa", put(set_two_factor))
        .route("/{id}/send-password-reset", post(send_password_reset))
}

fn db_err(e: sea_orm::DbErr) -> AuthError {
    AuthError::Database(e.to_string())
}

/// Appends to the activity log; a failed write never fails the request.
async fn log_activity(
    state: &AppState,
    client: &ClientInfo,
    user_id: Option<i32>,
    action: &str,
    is_success: bool,
    message: Option<String>,
) {
    let entry = NewActivity {
        user_id,
        ip: client.ip.clone(),
        action: action.to_string(),
        is_success,
        message,
        user_agent: client.user_agent.clone(),
        os: client.os.clone(),
    };
    if let Err(e) = ActivityLogRepository::new((*state.db).clone())
        .record(entry)
        .await
    {
        warn!(error = %e, action, "Failed to write activity log");
    }
}

fn refresh_cookie(token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/api/v1")
        .build()
}

/// Starts a new session, replacing any previous one.
async fn open_session(
    state: &AppState,
    repo: &UserRepository,
    user: &users::Model,
) -> ApiResult<TokenPair> {
    let session_id = UserRepository::generate_session_id();
    let access_token =
        state
            .jwt_service
            .generate_access_token(user.id, &user.username, &session_id)?;
    let refresh_token =
        state
            .jwt_service
            .generate_refresh_token(user.id, &user.username, &session_id)?;

    repo.start_session(user.id, &session_id, &refresh_token)
        .await?;

    Ok(TokenPair::new(
        access_token,
        refresh_token,
        state.jwt_service.access_token_expires_in(),
    ))
}

async fn check_credentials(
    repo: &UserRepository,
    payload: &LoginRequest,
) -> Result<users::Model, AuthError> {
    let Some(user) = repo
        .find_by_username(&payload.username)
        .await
        .map_err(db_err)?
    else {
        verify_dummy(&payload.password);
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password)? {
        return Err(AuthError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AuthError::InactiveAccount);
    }
    Ok(user)
}

/// POST /login - Authenticate with username and password.
async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let repo = UserRepository::new((*state.db).clone());

    let user = match check_credentials(&repo, &payload).await {
        Ok(user) => user,
        Err(err) => {
            if err.is_failed_login() {
                info!(username = %payload.username, reason = ?err, "Failed login attempt");
                log_activity(
                    &state,
                    &client,
                    None,
                    "login",
                    false,
                    Some(payload.username.clone()),
                )
                .await;
            }
            return Err(err.into());
        }
    };

    if user.is_two_factor_enabled {
        let expires_at = Utc::now() + Duration::seconds(state.config.auth.two_factor_window_secs);
        repo.set_challenge(user.id, Some(expires_at)).await?;
        info!(user_id = user.id, "Login waiting on second factor");
        return Ok((jar, Json(LoginResponse::two_factor_pending())));
    }

    let tokens = open_session(&state, &repo, &user).await?;
    log_activity(&state, &client, Some(user.id), "login", true, None).await;
    info!(user_id = user.id, "User logged in successfully");

    let jar = jar.add(refresh_cookie(tokens.refresh_token.clone()));
    Ok((jar, Json(LoginResponse::authenticated(tokens))))
}

async fn check_second_factor(
    state: &AppState,
    repo: &UserRepository,
    payload: &TwoFactorVerifyRequest,
) -> Result<users::Model, AuthError> {
    let user = repo
        .find_by_username(&payload.username)
        .await
        .map_err(db_err)?
        .ok_or(AuthError::BadOtp)?;

    let now = Utc::now();
    let pending = user
        .two_factor_challenge_expires_at
        .is_some_and(|expires_at| expires_at.to_utc() > now);
    let Some(secret) = user.otp_secret.as_deref().filter(|_| pending) else {
        return Err(AuthError::BadOtp);
    };

    let unix = u64::try_from(now.timestamp()).unwrap_or_default();
    if !totp::verify_at(
        secret,
        &state.config.auth.totp_issuer,
        &user.username,
        &payload.otp,
        unix,
    )? {
        return Err(AuthError::BadOtp);
    }
    if !user.is_active {
        return Err(AuthError::InactiveAccount);
    }
    Ok(user)
}

/// POST /two-fa - Complete a login with a TOTP code.
async fn verify_two_factor(
    State(state): State<AppState>,
    client: ClientInfo,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<TwoFactorVerifyRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let repo = UserRepository::new((*state.db).clone());

    let user = match check_second_factor(&state, &repo, &payload).await {
        Ok(user) => user,
        Err(err) => {
            if err.is_failed_login() {
                log_activity(
                    &state,
                    &client,
                    None,
                    "two-fa",
                    false,
                    Some(payload.username.clone()),
                )
                .await;
            }
            return Err(err.into());
        }
    };

    let tokens = open_session(&state, &repo, &user).await?;
    log_activity(&state, &client, Some(user.id), "two-fa", true, None).await;
    info!(user_id = user.id, "Second factor accepted");

    let jar = jar.add(refresh_cookie(tokens.refresh_token.clone()));
    Ok((jar, Json(LoginResponse::authenticated(tokens))))
}

/// GET /token - Exchange the refresh token for a new access token.
///
/// The token comes from the `refresh_token` cookie, or from a JSON body
/// for clients that cannot keep cookies.
async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<Json<AccessTokenResponse>> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            serde_json::from_slice::<RefreshRequest>(&body)
                .ok()
                .and_then(|request| request.refresh_token)
        })
        .ok_or_else(|| ApiError::unauthenticated("Refresh token is required"))?;

    let claims = state
        .jwt_service
        .validate_typed(&token, TokenType::Refresh)?;

    let digest = UserRepository::hash_token(&token);
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(claims.user_id())
        .await?
        .filter(|user| {
            user.is_active
                && user.session_id.as_deref() == Some(claims.session_id())
                && user.refresh_token.as_deref() == Some(digest.as_str())
        })
        .ok_or_else(|| ApiError::unauthenticated("Refresh token has been revoked"))?;

    let access_token =
        state
            .jwt_service
            .generate_access_token(user.id, &user.username, claims.session_id())?;

    Ok(Json(AccessTokenResponse {
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// DELETE /logout - End the caller's session.
async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    UserRepository::new((*state.db).clone())
        .clear_session(user.user_id())
        .await?;
    log_activity(&state, &client, Some(user.user_id()), "logout", true, None).await;
    info!(user_id = user.user_id(), "User logged out");

    let jar = jar.remove(Cookie::build(REFRESH_COOKIE).path("/api/v1"));
    Ok((jar, Json(MessageResponse::new("Logged out"))))
}

/// GET /user-info - The caller's profile.
async fn user_info(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<UserInfo>> {
    let (model, department) = UserRepository::new((*state.db).clone())
        .find_with_department(user.user_id())
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Session has been revoked"))?;
    let roles = AccessRepository::new((*state.db).clone())
        .role_names(user.user_id())
        .await?;

    Ok(Json(UserInfo {
        id: model.id,
        username: model.username,
        name: model.name,
        email: model.email,
        is_two_factor_enabled: model.is_two_factor_enabled,
        department: department.map(|d| DepartmentInfo {
            id: d.id,
            code: d.code,
            name: d.name,
        }),
        roles,
    }))
}

/// PUT /change-password - Replace the caller's password.
async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let repo = UserRepository::new((*state.db).clone());
    let current = repo
        .find_by_id(user.user_id())
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Session has been revoked"))?;

    if !verify_password(&payload.current_password, &current.password).map_err(AuthError::from)? {
        return Err(AuthError::CurrentPasswordMismatch.into());
    }

    let hash = hash_password(&payload.new_password).map_err(AuthError::from)?;
    repo.set_password(current.id, &hash).await?;
    info!(user_id = current.id, "Password changed");

    Ok(Json(MessageResponse::new("Password changed")))
}

/// Managing another user's credentials needs update rights on the user menu.
async fn ensure_self_or_admin(state: &AppState, user: &AuthUser, target: i32) -> ApiResult<()> {
    if user.user_id() == target {
        return Ok(());
    }
    state.gate(user.user_id(), USER_MENU, Action::Update).await
}

/// PUT /{id}/two-fa - Enable or disable the second factor.
async fn set_two_factor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<SetTwoFactorRequest>,
) -> ApiResult<Json<SetTwoFactorResponse>> {
    ensure_self_or_admin(&state, &user, id).await?;

    let repo = UserRepository::new((*state.db).clone());
    let target = repo
        .find_by_id(id)
        .await?
        .ok_or(AuthError::UserNotFound(id))?;

    let enrollment = if payload.enabled {
        let enrollment = totp::enroll(&state.config.auth.totp_issuer, &target.username)?;
        Some((enrollment.secret, enrollment.url))
    } else {
        None
    };

    let updated = repo.set_two_factor(id, enrollment).await?;
    info!(
        user_id = id,
        enabled = updated.is_two_factor_enabled,
        "Second factor updated"
    );

    Ok(Json(SetTwoFactorResponse {
        is_two_factor_enabled: updated.is_two_factor_enabled,
        otp_url: updated.otp_url,
    }))
}

/// POST /{id}/send-password-reset - Mail a reset link.
///
/// The answer is the same whether or not the user exists.
async fn send_password_reset(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<MessageResponse>> {
    ensure_self_or_admin(&state, &user, id).await?;

    let ttl = Duration::seconds(state.config.auth.password_reset_ttl_secs);
    let issued = PasswordResetRepository::new((*state.db).clone())
        .request(id, ttl, state.config.auth.password_reset_throttle_secs)
        .await;

    match issued {
        Ok(issued) => match issued.user.email.clone() {
            Some(email) => {
                let mailer = state.email_service.clone();
                tokio::spawn(async move {
                    if let Err(e) = mailer
                        .send_password_reset_email(
                            &email,
                            &issued.user.name,
                            &issued.token,
                            ttl.num_minutes(),
                        )
                        .await
                    {
                        warn!(error = %e, user_id = issued.user.id, "Failed to send reset email");
                    }
                });
            }
            None => warn!(user_id = id, "Password reset issued for a user without email"),
        },
        Err(AuthError::UserNotFound(_)) => {
            info!(user_id = id, "Password reset requested for unknown user");
            state.reset_throttle.check(id, Utc::now())?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Json(MessageResponse::new(
        "If the account exists, a password reset email has been sent",
    )))
}

/// POST /password-reset - Redeem a reset token.
async fn password_reset(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<PasswordResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let hash = hash_password(&payload.new_password).map_err(AuthError::from)?;
    let user_id = PasswordResetRepository::new((*state.db).clone())
        .redeem(&payload.token, &hash)
        .await?;

    log_activity(&state, &client, Some(user_id), "password-reset", true, None).await;
    Ok(Json(MessageResponse::new("Password has been reset")))
}
