//! User repository for database operations.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use foundry_shared::types::{ListQuery, ListResponse, UserInput};

use super::listing::{ListColumns, fetch_page};
use super::master::MasterError;
use crate::entities::{departments, user_roles, users};

/// A user with the roles they hold.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRoles {
    /// The user record, credentials skipped.
    #[serde(flatten)]
    pub user: users::Model,
    /// Role IDs, ascending.
    pub role_ids: Vec<i32>,
}

async fn replace_roles<C>(conn: &C, user_id: i32, role_ids: &BTreeSet<i32>) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    user_roles::Entity::delete_many()
        .filter(user_roles::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    for role_id in role_ids {
        user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(*role_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// User repository for CRUD and session operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hashes a refresh token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Generates a random URL-safe identifier for a login session.
    #[must_use]
    pub fn generate_session_id() -> String {
        let bytes: [u8; 24] = rand::random();
        base64_url::encode(&bytes)
    }

    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user together with their department.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_with_department(
        &self,
        id: i32,
    ) -> Result<Option<(users::Model, Option<departments::Model>)>, DbErr> {
        users::Entity::find_by_id(id)
            .find_also_related(departments::Entity)
            .one(&self.db)
            .await
    }

    /// Opens a session: stores its ID and the refresh token digest, and
    /// clears any pending second-factor challenge.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn start_session(
        &self,
        user_id: i32,
        session_id: &str,
        refresh_token: &str,
    ) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            session_id: Set(Some(session_id.to_string())),
            refresh_token: Set(Some(Self::hash_token(refresh_token))),
            two_factor_challenge_expires_at: Set(None),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Clears the session and refresh token, revoking every issued token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn clear_session(&self, user_id: i32) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            session_id: Set(None),
            refresh_token: Set(None),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Records (or clears) a pending second-factor login.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_challenge(
        &self,
        user_id: i32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            two_factor_challenge_expires_at: Set(expires_at.map(Into::into)),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Replaces the password hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_password(&self, user_id: i32, password_hash: &str) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            password: Set(password_hash.to_string()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Enables second factor with `secret`/`url`, or disables it with `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_two_factor(
        &self,
        user_id: i32,
        enrollment: Option<(String, String)>,
    ) -> Result<users::Model, DbErr> {
        let enabled = enrollment.is_some();
        let (secret, url) = enrollment.unzip();

        users::ActiveModel {
            id: Set(user_id),
            is_two_factor_enabled: Set(enabled),
            otp_secret: Set(secret),
            otp_url: Set(url),
            two_factor_challenge_expires_at: Set(None),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&self.db)
        .await
    }

    /// Lists users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, query: &ListQuery) -> Result<ListResponse<users::Model>, MasterError> {
        let columns = ListColumns {
            search: vec![users::Column::Username, users::Column::Name, users::Column::Email],
            sort: vec![
                users::Column::Id,
                users::Column::Username,
                users::Column::Name,
                users::Column::Email,
                users::Column::IsActive,
                users::Column::IsTwoFactorEnabled,
                users::Column::DepartmentId,
                users::Column::EmployeeId,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ],
            id: users::Column::Id,
            updated_at: users::Column::UpdatedAt,
        };
        Ok(fetch_page(&self.db, users::Entity::find(), query, &columns).await?)
    }

    /// Finds a user with their role IDs.
    ///
    /// # Errors
    ///
    /// Returns `MasterError::NotFound` when the user does not exist.
    pub async fn find_with_roles(&self, id: i32) -> Result<UserWithRoles, MasterError> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or(MasterError::NotFound { table: "users", id })?;

        let mut role_ids: Vec<i32> = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| row.role_id)
            .collect();
        role_ids.sort_unstable();

        Ok(UserWithRoles { user, role_ids })
    }

    /// Creates a user with an already hashed password.
    ///
    /// # Errors
    ///
    /// Returns `MasterError::Conflict` on a duplicate username.
    pub async fn create(
        &self,
        input: UserInput,
        password_hash: String,
        actor: i32,
    ) -> Result<UserWithRoles, MasterError> {
        let role_ids: BTreeSet<i32> = input.role_ids.iter().copied().collect();
        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let user = users::ActiveModel {
            username: Set(input.username),
            name: Set(input.name),
            email: Set(input.email),
            password: Set(password_hash),
            otp_secret: Set(None),
            otp_url: Set(None),
            refresh_token: Set(None),
            session_id: Set(None),
            is_active: Set(input.is_active),
            is_two_factor_enabled: Set(false),
            two_factor_challenge_expires_at: Set(None),
            department_id: Set(input.department_id),
            employee_id: Set(input.employee_id),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        replace_roles(&txn, user.id, &role_ids).await?;
        txn.commit().await?;

        info!(user_id = user.id, username = %user.username, "User created");
        Ok(UserWithRoles {
            user,
            role_ids: role_ids.into_iter().collect(),
        })
    }

    /// Updates a user; `password_hash` of `None` keeps the current hash.
    ///
    /// Deactivating a user also ends their session.
    ///
    /// # Errors
    ///
    /// Returns `MasterError::NotFound` or `MasterError::Conflict`.
    pub async fn update(
        &self,
        id: i32,
        input: UserInput,
        password_hash: Option<String>,
        actor: i32,
    ) -> Result<UserWithRoles, MasterError> {
        let role_ids: BTreeSet<i32> = input.role_ids.iter().copied().collect();
        let txn = self.db.begin().await?;

        let existing = users::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(MasterError::NotFound { table: "users", id })?;

        let mut active: users::ActiveModel = existing.into();
        active.username = Set(input.username);
        active.name = Set(input.name);
        active.email = Set(input.email);
        if let Some(hash) = password_hash {
            active.password = Set(hash);
        }
        if !input.is_active {
            active.session_id = Set(None);
            active.refresh_token = Set(None);
        }
        active.is_active = Set(input.is_active);
        active.department_id = Set(input.department_id);
        active.employee_id = Set(input.employee_id);
        active.updated_by = Set(Some(actor));
        active.updated_at = Set(Utc::now().into());
        let user = active.update(&txn).await?;

        replace_roles(&txn, id, &role_ids).await?;
        txn.commit().await?;

        Ok(UserWithRoles {
            user,
            role_ids: role_ids.into_iter().collect(),
        })
    }

    /// Deletes a user.
    ///
    /// # Errors
    ///
    /// Returns `MasterError::NotFound` when the user does not exist.
    pub async fn delete(&self, id: i32) -> Result<(), MasterError> {
        let txn = self.db.begin().await?;
        user_roles::Entity::delete_many()
            .filter(user_roles::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        let result = users::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(MasterError::NotFound { table: "users", id });
        }
        txn.commit().await?;

        info!(user_id = id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_sha256_hex() {
        let digest = UserRepository::hash_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = UserRepository::generate_session_id();
        let b = UserRepository::generate_session_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
