//! Menu catalog repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Iterable, QueryFilter,
    Set, SqlErr,
};
use tracing::info;

use foundry_core::access::{AccessError, ROOT, would_cycle};
use foundry_shared::types::{ListQuery, ListResponse, MenuInput};

use super::access::all_records;
use super::listing::{ListColumns, fetch_page};
use crate::entities::menus;

fn db_err(e: DbErr) -> AccessError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AccessError::Conflict("A menu with this path already exists".into())
        }
        _ => AccessError::Database(e.to_string()),
    }
}

/// Menu catalog repository.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    db: DatabaseConnection,
}

impl MenuRepository {
    /// Creates a new menu repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists menus that are not soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, query: &ListQuery) -> Result<ListResponse<menus::Model>, AccessError> {
        let select = menus::Entity::find().filter(menus::Column::IsDelete.eq(false));
        let columns = ListColumns {
            search: vec![menus::Column::Label, menus::Column::Path],
            sort: menus::Column::iter().collect(),
            id: menus::Column::Id,
            updated_at: menus::Column::UpdatedAt,
        };
        fetch_page(&self.db, select, query, &columns)
            .await
            .map_err(db_err)
    }

    /// Finds a menu by ID, soft-deleted ones included.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::MenuNotFound` when the menu does not exist.
    pub async fn find(&self, id: i32) -> Result<menus::Model, AccessError> {
        menus::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(AccessError::MenuNotFound(id))
    }

    async fn check_parent(&self, id: Option<i32>, parent_id: i32) -> Result<(), AccessError> {
        if parent_id == ROOT {
            return Ok(());
        }
        let records = all_records(&self.db).await.map_err(db_err)?;
        if !records.iter().any(|m| m.id == parent_id) {
            return Err(AccessError::ParentNotFound(parent_id));
        }
        if let Some(id) = id
            && would_cycle(&records, Some(id), parent_id)
        {
            return Err(AccessError::Cycle { id, parent_id });
        }
        Ok(())
    }

    /// Creates a menu.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::ParentNotFound` or `AccessError::Conflict`.
    pub async fn create(&self, input: MenuInput) -> Result<menus::Model, AccessError> {
        self.check_parent(None, input.parent_id).await?;

        let now = chrono::Utc::now().into();
        let menu = menus::ActiveModel {
            label: Set(input.label),
            path: Set(input.path),
            parent_id: Set(input.parent_id),
            sort: Set(input.sort),
            icon: Set(input.icon),
            is_delete: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        info!(menu_id = menu.id, path = %menu.path, "Menu created");
        Ok(menu)
    }

    /// Updates a menu.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::MenuNotFound`, `AccessError::ParentNotFound`,
    /// `AccessError::Cycle` or `AccessError::Conflict`.
    pub async fn update(&self, id: i32, input: MenuInput) -> Result<menus::Model, AccessError> {
        let existing = self.find(id).await?;
        if input.parent_id == id {
            return Err(AccessError::Cycle {
                id,
                parent_id: input.parent_id,
            });
        }
        self.check_parent(Some(id), input.parent_id).await?;

        let mut active: menus::ActiveModel = existing.into();
        active.label = Set(input.label);
        active.path = Set(input.path);
        active.parent_id = Set(input.parent_id);
        active.sort = Set(input.sort);
        active.icon = Set(input.icon);
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await.map_err(db_err)
    }

    /// Soft-deletes a menu; descendants disappear from every tree with it.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::MenuNotFound` when the menu does not exist.
    pub async fn delete(&self, id: i32) -> Result<(), AccessError> {
        let existing = self.find(id).await?;

        let mut active: menus::ActiveModel = existing.into();
        active.is_delete = Set(true);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.db).await.map_err(db_err)?;

        info!(menu_id = id, "Menu soft-deleted");
        Ok(())
    }
}
