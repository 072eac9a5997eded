//! Authorization evaluator: visible menus and effective permission bits.

use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use tracing::{error, warn};

use foundry_core::access::{
    AccessError, Action, MenuForest, MenuNode, MenuRecord, PermissionBits, annotate, build_forest,
    check_gate, effective, flatten_ids,
};

use crate::entities::{menus, role_menus, role_permissions, roles, user_roles};

fn db_err(e: DbErr) -> AccessError {
    AccessError::Database(e.to_string())
}

/// Loads every menu as a flat list.
pub(crate) async fn all_records<C>(conn: &C) -> Result<Vec<MenuRecord>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(menus::Entity::find()
        .all(conn)
        .await?
        .into_iter()
        .map(MenuRecord::from)
        .collect())
}

fn report_cycles(forest: &MenuForest) {
    if !forest.cyclic.is_empty() {
        error!(menus = ?forest.cyclic, "Menu parent chain loops; subtree dropped");
    }
}

/// Read side of the role graph.
#[derive(Debug, Clone)]
pub struct AccessRepository {
    db: DatabaseConnection,
}

impl AccessRepository {
    /// Creates a new access repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Role IDs held by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn role_ids(&self, user_id: i32) -> Result<Vec<i32>, AccessError> {
        Ok(user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|row| row.role_id)
            .collect())
    }

    /// Role names held by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn role_names(&self, user_id: i32) -> Result<Vec<String>, AccessError> {
        let ids = self.role_ids(user_id).await?;
        let mut names: Vec<String> = roles::Entity::find()
            .filter(roles::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|role| role.name)
            .collect();
        names.sort();
        Ok(names)
    }

    async fn granted_menus(&self, role_ids: Vec<i32>) -> Result<HashSet<i32>, AccessError> {
        Ok(role_menus::Entity::find()
            .filter(role_menus::Column::RoleId.is_in(role_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|row| row.menu_id)
            .collect())
    }

    /// The user's visible menu forest.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_tree(&self, user_id: i32) -> Result<Vec<MenuNode>, AccessError> {
        let role_ids = self.role_ids(user_id).await?;
        let granted = self.granted_menus(role_ids).await?;
        let menus = all_records(&self.db).await.map_err(db_err)?;

        let forest = build_forest(&menus, Some(&granted));
        report_cycles(&forest);
        Ok(forest.roots)
    }

    /// The full menu forest, soft-deleted menus excluded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn full_tree(&self) -> Result<Vec<MenuNode>, AccessError> {
        let menus = all_records(&self.db).await.map_err(db_err)?;
        let forest = build_forest(&menus, None);
        report_cycles(&forest);
        Ok(forest.roots)
    }

    /// The role's menu forest, each node annotated with the role's bits.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::RoleNotFound` for an unknown role.
    pub async fn role_tree(&self, role_id: i32) -> Result<Vec<MenuNode>, AccessError> {
        roles::Entity::find_by_id(role_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(AccessError::RoleNotFound(role_id))?;

        let granted = self.granted_menus(vec![role_id]).await?;
        let menus = all_records(&self.db).await.map_err(db_err)?;
        let bits: HashMap<i32, PermissionBits> = role_permissions::Entity::find()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|row| (row.menu_id, row.bits()))
            .collect();

        let mut forest = build_forest(&menus, Some(&granted));
        report_cycles(&forest);
        annotate(&mut forest.roots, &bits);
        Ok(forest.roots)
    }

    /// Whether the menu at `path` is in the user's tree, and the user's
    /// effective bits on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn evaluate(
        &self,
        user_id: i32,
        path: &str,
    ) -> Result<(bool, PermissionBits), AccessError> {
        let Some(menu) = menus::Entity::find()
            .filter(menus::Column::Path.eq(path))
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            warn!(menu = %path, "Gate on an unknown menu path");
            return Ok((false, PermissionBits::default()));
        };

        let role_ids = self.role_ids(user_id).await?;
        let granted = self.granted_menus(role_ids.clone()).await?;
        if !granted.contains(&menu.id) {
            return Ok((false, PermissionBits::default()));
        }

        let menus = all_records(&self.db).await.map_err(db_err)?;
        let forest = build_forest(&menus, Some(&granted));
        let visible = flatten_ids(&forest.roots).contains(&menu.id);

        let bits = effective(
            role_permissions::Entity::find()
                .filter(role_permissions::Column::RoleId.is_in(role_ids))
                .filter(role_permissions::Column::MenuId.eq(menu.id))
                .all(&self.db)
                .await
                .map_err(db_err)?
                .iter()
                .map(role_permissions::Model::bits),
        );

        Ok((visible, bits))
    }

    /// Passes when the user may perform `action` on the menu at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::MenuNotVisible` or `AccessError::MissingPermission`.
    pub async fn gate(&self, user_id: i32, path: &str, action: Action) -> Result<(), AccessError> {
        let (visible, bits) = self.evaluate(user_id, path).await?;
        check_gate(path, visible, bits, action)
    }
}
