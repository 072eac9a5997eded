//! Permission editor.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;

use foundry_core::access::{AccessError, PermissionBits, UpsertPlan, plan_upsert};

use crate::entities::{menus, role_permissions, roles};

fn db_err(e: DbErr) -> AccessError {
    AccessError::Database(e.to_string())
}

/// Role permission repository.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    db: DatabaseConnection,
}

impl PermissionRepository {
    /// Creates a new permission repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Sets the bits of a role on a menu.
    ///
    /// Clearing every bit removes the row; returns the row as stored
    /// afterwards, `None` when none remains.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::RoleNotFound` or `AccessError::MenuNotFound`.
    pub async fn upsert(
        &self,
        role_id: i32,
        menu_id: i32,
        bits: PermissionBits,
    ) -> Result<Option<role_permissions::Model>, AccessError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        roles::Entity::find_by_id(role_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(AccessError::RoleNotFound(role_id))?;
        menus::Entity::find_by_id(menu_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(AccessError::MenuNotFound(menu_id))?;

        let existing = role_permissions::Entity::find_by_id((role_id, menu_id))
            .one(&txn)
            .await
            .map_err(db_err)?;

        let row = match plan_upsert(existing.as_ref().map(role_permissions::Model::bits), bits) {
            UpsertPlan::Noop => None,
            UpsertPlan::Delete => {
                role_permissions::Entity::delete_by_id((role_id, menu_id))
                    .exec(&txn)
                    .await
                    .map_err(db_err)?;
                None
            }
            UpsertPlan::Insert(bits) => Some(
                role_permissions::ActiveModel {
                    role_id: Set(role_id),
                    menu_id: Set(menu_id),
                    is_create: Set(bits.is_create),
                    is_update: Set(bits.is_update),
                    is_delete: Set(bits.is_delete),
                }
                .insert(&txn)
                .await
                .map_err(db_err)?,
            ),
            UpsertPlan::Update(bits) => Some(
                role_permissions::ActiveModel {
                    role_id: Set(role_id),
                    menu_id: Set(menu_id),
                    is_create: Set(bits.is_create),
                    is_update: Set(bits.is_update),
                    is_delete: Set(bits.is_delete),
                }
                .update(&txn)
                .await
                .map_err(db_err)?,
            ),
        };

        txn.commit().await.map_err(db_err)?;
        info!(role_id, menu_id, ?bits, "Permission updated");
        Ok(row)
    }

    /// Removes the bits of a role on a menu.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::PermissionNotFound` when no row exists.
    pub async fn delete(&self, role_id: i32, menu_id: i32) -> Result<(), AccessError> {
        let result = role_permissions::Entity::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .filter(role_permissions::Column::MenuId.eq(menu_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AccessError::PermissionNotFound { role_id, menu_id });
        }
        Ok(())
    }
}
