//! Role repository: roles and their visible menu sets.

use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    Iterable, QueryFilter, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use foundry_core::access::AccessError;
use foundry_shared::types::{ListQuery, ListResponse, RoleInput};

use super::listing::{ListColumns, fetch_page};
use crate::entities::{menus, role_menus, role_permissions, roles, user_roles};

fn db_err(e: DbErr) -> AccessError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AccessError::Conflict("A role with this name already exists".into())
        }
        _ => AccessError::Database(e.to_string()),
    }
}

/// A role with the menus it can see.
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithMenus {
    /// The role record.
    #[serde(flatten)]
    pub role: roles::Model,
    /// Visible menu IDs, ascending.
    pub menu_ids: Vec<i32>,
}

async fn replace_menus<C>(conn: &C, role_id: i32, menu_ids: &BTreeSet<i32>) -> Result<(), AccessError>
where
    C: ConnectionTrait,
{
    let known: BTreeSet<i32> = menus::Entity::find()
        .filter(menus::Column::Id.is_in(menu_ids.iter().copied()))
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|menu| menu.id)
        .collect();
    if let Some(missing) = menu_ids.difference(&known).next() {
        return Err(AccessError::MenuNotFound(*missing));
    }

    role_menus::Entity::delete_many()
        .filter(role_menus::Column::RoleId.eq(role_id))
        .exec(conn)
        .await
        .map_err(db_err)?;

    for menu_id in menu_ids {
        role_menus::ActiveModel {
            role_id: Set(role_id),
            menu_id: Set(*menu_id),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

/// Role repository.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    db: DatabaseConnection,
}

impl RoleRepository {
    /// Creates a new role repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists roles.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, query: &ListQuery) -> Result<ListResponse<roles::Model>, AccessError> {
        let columns = ListColumns {
            search: vec![roles::Column::Name, roles::Column::Description],
            sort: roles::Column::iter().collect(),
            id: roles::Column::Id,
            updated_at: roles::Column::UpdatedAt,
        };
        fetch_page(&self.db, roles::Entity::find(), query, &columns)
            .await
            .map_err(db_err)
    }

    /// Finds a role and its menus.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::RoleNotFound` when the role does not exist.
    pub async fn find(&self, id: i32) -> Result<RoleWithMenus, AccessError> {
        let role = roles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(AccessError::RoleNotFound(id))?;

        let mut menu_ids: Vec<i32> = role_menus::Entity::find()
            .filter(role_menus::Column::RoleId.eq(id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|row| row.menu_id)
            .collect();
        menu_ids.sort_unstable();

        Ok(RoleWithMenus { role, menu_ids })
    }

    /// Creates a role with its menu set.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Conflict` on a duplicate name,
    /// `AccessError::MenuNotFound` for an unknown menu.
    pub async fn create(&self, input: RoleInput) -> Result<RoleWithMenus, AccessError> {
        let menu_ids: BTreeSet<i32> = input.menu_ids.iter().copied().collect();
        let txn = self.db.begin().await.map_err(db_err)?;

        let now = chrono::Utc::now().into();
        let role = roles::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        replace_menus(&txn, role.id, &menu_ids).await?;
        txn.commit().await.map_err(db_err)?;

        info!(role_id = role.id, name = %role.name, "Role created");
        Ok(RoleWithMenus {
            role,
            menu_ids: menu_ids.into_iter().collect(),
        })
    }

    /// Updates a role and replaces its menu set atomically.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::RoleNotFound`, `AccessError::Conflict` or
    /// `AccessError::MenuNotFound`.
    pub async fn update(&self, id: i32, input: RoleInput) -> Result<RoleWithMenus, AccessError> {
        let menu_ids: BTreeSet<i32> = input.menu_ids.iter().copied().collect();
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = roles::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(AccessError::RoleNotFound(id))?;

        let mut active: roles::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.updated_at = Set(chrono::Utc::now().into());
        let role = active.update(&txn).await.map_err(db_err)?;

        replace_menus(&txn, id, &menu_ids).await?;
        txn.commit().await.map_err(db_err)?;

        Ok(RoleWithMenus {
            role,
            menu_ids: menu_ids.into_iter().collect(),
        })
    }

    /// Deletes a role; its menu, permission and user links go with it.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::RoleNotFound` when the role does not exist.
    pub async fn delete(&self, id: i32) -> Result<(), AccessError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        role_menus::Entity::delete_many()
            .filter(role_menus::Column::RoleId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        role_permissions::Entity::delete_many()
            .filter(role_permissions::Column::RoleId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        user_roles::Entity::delete_many()
            .filter(user_roles::Column::RoleId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let result = roles::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(AccessError::RoleNotFound(id));
        }
        txn.commit().await.map_err(db_err)?;

        info!(role_id = id, "Role deleted");
        Ok(())
    }
}
