//! Generic CRUD for the master-data tables.

use std::marker::PhantomData;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, SqlErr,
};
use tracing::info;

use foundry_shared::types::pagination::{ListQuery, ListResponse};

use super::approval::initial_status;
use super::listing::{ListColumns, fetch_page};
use crate::entities::master::MasterTable;

/// Error types for master-data operations.
#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    /// Row not found.
    #[error("Record {id} not found in {table}")]
    NotFound {
        /// Table name.
        table: &'static str,
        /// Record ID.
        id: i32,
    },

    /// A unique column already holds the value.
    #[error("Duplicate value: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(DbErr),
}

impl From<DbErr> for MasterError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Conflict(detail),
            _ => Self::Database(err),
        }
    }
}

impl MasterError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "internal",
        }
    }
}

/// CRUD over one master table.
#[derive(Debug, Clone)]
pub struct MasterRepository<E> {
    db: DatabaseConnection,
    entity: PhantomData<E>,
}

impl<E> MasterRepository<E>
where
    E: MasterTable,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync + 'static,
    E::ActiveModel: Send,
{
    /// Creates a new repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            entity: PhantomData,
        }
    }

    fn columns() -> ListColumns<E::Column> {
        ListColumns {
            search: E::search_columns(),
            sort: E::sort_columns(),
            id: E::id_column(),
            updated_at: E::updated_at_column(),
        }
    }

    fn not_found(id: i32) -> MasterError {
        MasterError::NotFound {
            table: E::TABLE,
            id,
        }
    }

    /// Lists a page of rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, query: &ListQuery) -> Result<ListResponse<E::Model>, MasterError> {
        Ok(fetch_page(&self.db, E::find(), query, &Self::columns()).await?)
    }

    /// Finds a row by ID.
    ///
    /// # Errors
    ///
    /// Returns `MasterError::NotFound` when the row does not exist.
    pub async fn find(&self, id: i32) -> Result<E::Model, MasterError> {
        E::find()
            .filter(E::id_column().eq(id))
            .one(&self.db)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Inserts a row.
    ///
    /// The row starts `pending` when the table's menu has a create chain,
    /// `active` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `MasterError::Conflict` on a duplicate unique value.
    pub async fn create(&self, input: E::Input, actor: i32) -> Result<E::Model, MasterError> {
        let status = initial_status(&self.db, E::MENU_PATH).await?;
        let now = chrono::Utc::now().into();
        let model = E::new_active(input, actor, status, now).insert(&self.db).await?;

        info!(table = E::TABLE, id = E::id_of(&model), status, "Master record created");
        Ok(model)
    }

    /// Overwrites the writable fields of a row.
    ///
    /// # Errors
    ///
    /// Returns `MasterError::NotFound` or `MasterError::Conflict`.
    pub async fn update(
        &self,
        id: i32,
        input: E::Input,
        actor: i32,
    ) -> Result<E::Model, MasterError> {
        let existing = self.find(id).await?;
        let now = chrono::Utc::now().into();
        let model = E::apply(existing, input, actor, now).update(&self.db).await?;

        info!(table = E::TABLE, id, "Master record updated");
        Ok(model)
    }

    /// Deletes a row.
    ///
    /// # Errors
    ///
    /// Returns `MasterError::NotFound` when the row does not exist.
    pub async fn delete(&self, id: i32) -> Result<(), MasterError> {
        let result = E::delete_many()
            .filter(E::id_column().eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(Self::not_found(id));
        }

        info!(table = E::TABLE, id, "Master record deleted");
        Ok(())
    }
}
