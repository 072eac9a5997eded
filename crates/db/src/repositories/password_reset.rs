//! Password reset tokens.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tracing::info;

use foundry_core::auth::{AuthError, ResetTokenState, check_reset_throttle, check_reset_token};

use super::user::UserRepository;
use crate::entities::{password_resets, users};

fn db_err(e: DbErr) -> AuthError {
    AuthError::Database(e.to_string())
}

/// A freshly issued reset token; the raw value is only ever held here.
#[derive(Debug, Clone)]
pub struct IssuedReset {
    /// User the token belongs to.
    pub user: users::Model,
    /// Raw token to mail.
    pub token: String,
}

/// Password reset repository.
#[derive(Debug, Clone)]
pub struct PasswordResetRepository {
    db: DatabaseConnection,
}

impl PasswordResetRepository {
    /// Creates a new password reset repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Generates a random reset token.
    #[must_use]
    pub fn generate_token() -> String {
        let bytes: [u8; 32] = rand::random();
        base64_url::encode(&bytes)
    }

    /// Issues a reset token for a user; only its digest is stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` or `AuthError::RateLimited`.
    pub async fn request(
        &self,
        user_id: i32,
        ttl: Duration,
        throttle_secs: i64,
    ) -> Result<IssuedReset, AuthError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(AuthError::UserNotFound(user_id))?;

        let now = Utc::now();
        let latest = password_resets::Entity::find()
            .filter(password_resets::Column::UserId.eq(user_id))
            .order_by_desc(password_resets::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        check_reset_throttle(latest.map(|r| r.created_at.to_utc()), now, throttle_secs)?;

        let token = Self::generate_token();
        password_resets::ActiveModel {
            user_id: Set(user_id),
            token: Set(UserRepository::hash_token(&token)),
            is_used: Set(false),
            expires_at: Set((now + ttl).into()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        info!(user_id, "Password reset issued");
        Ok(IssuedReset { user, token })
    }

    /// Redeems a token: sets the new password hash, marks the token used
    /// and ends the user's session, all at once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken`, `AuthError::ExpiredToken` or
    /// `AuthError::AlreadyUsed`.
    pub async fn redeem(&self, token: &str, password_hash: &str) -> Result<i32, AuthError> {
        let digest = UserRepository::hash_token(token);
        let txn = self.db.begin().await.map_err(db_err)?;

        let reset = password_resets::Entity::find()
            .filter(password_resets::Column::Token.eq(digest))
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(AuthError::InvalidToken)?;

        let now = Utc::now();
        check_reset_token(
            ResetTokenState {
                is_used: reset.is_used,
                expires_at: reset.expires_at.to_utc(),
            },
            now,
        )?;

        // Two concurrent redemptions both pass the check above; only one flips the flag.
        let claimed = password_resets::Entity::update_many()
            .col_expr(password_resets::Column::IsUsed, Expr::value(true))
            .col_expr(password_resets::Column::UpdatedAt, Expr::value(now))
            .filter(password_resets::Column::Id.eq(reset.id))
            .filter(password_resets::Column::IsUsed.eq(false))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if claimed.rows_affected == 0 {
            return Err(AuthError::AlreadyUsed);
        }

        users::ActiveModel {
            id: Set(reset.user_id),
            password: Set(password_hash.to_string()),
            session_id: Set(None),
            refresh_token: Set(None),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        info!(user_id = reset.user_id, "Password reset redeemed");
        Ok(reset.user_id)
    }
}
