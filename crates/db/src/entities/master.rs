//! Shared shape of the master-data tables.
//!
//! Every master table has an integer `id`, its own fields, a `status`, and
//! the audit columns `created_by`, `updated_by`, `created_at`, `updated_at`.
//! [`MasterTable`] exposes what the generic repository and HTTP handlers
//! need; the `master_table!` macro implements it from the list of writable
//! fields.

use sea_orm::EntityTrait;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::de::DeserializeOwned;

/// A master-data entity served by the generic CRUD endpoints.
pub trait MasterTable: EntityTrait {
    /// Writable fields accepted on create and update.
    type Input: DeserializeOwned + Send + 'static;

    /// Table name, also the `ref_table` of approval history.
    const TABLE: &'static str;

    /// Menu path gating the table's endpoints and approval chains.
    const MENU_PATH: &'static str;

    /// Text columns matched by the list `search` parameter.
    fn search_columns() -> Vec<Self::Column>;

    /// Columns accepted by the list `sort` parameter.
    fn sort_columns() -> Vec<Self::Column>;

    /// The `id` column.
    fn id_column() -> Self::Column;

    /// The `updated_at` column, default sort key of list pages.
    fn updated_at_column() -> Self::Column;

    /// Builds a new row.
    fn new_active(
        input: Self::Input,
        actor: i32,
        status: &str,
        now: DateTimeWithTimeZone,
    ) -> Self::ActiveModel;

    /// Overwrites the writable fields of an existing row.
    fn apply(
        model: Self::Model,
        input: Self::Input,
        actor: i32,
        now: DateTimeWithTimeZone,
    ) -> Self::ActiveModel;

    /// Primary key of a row.
    fn id_of(model: &Self::Model) -> i32;
}

macro_rules! master_table {
    (
        table: $table:literal,
        path: $path:literal,
        search: [$($search:ident),* $(,)?],
        fields: [$($field:ident),* $(,)?] $(,)?
    ) => {
        impl $crate::entities::master::MasterTable for Entity {
            type Input = Input;

            const TABLE: &'static str = $table;
            const MENU_PATH: &'static str = $path;

            fn search_columns() -> Vec<Column> {
                vec![$(Column::$search),*]
            }

            fn sort_columns() -> Vec<Column> {
                <Column as sea_orm::Iterable>::iter().collect()
            }

            fn id_column() -> Column {
                Column::Id
            }

            fn updated_at_column() -> Column {
                Column::UpdatedAt
            }

            fn new_active(
                input: Input,
                actor: i32,
                status: &str,
                now: sea_orm::prelude::DateTimeWithTimeZone,
            ) -> ActiveModel {
                ActiveModel {
                    id: sea_orm::ActiveValue::NotSet,
                    $($field: sea_orm::ActiveValue::Set(input.$field),)*
                    status: sea_orm::ActiveValue::Set(status.to_string()),
                    created_by: sea_orm::ActiveValue::Set(Some(actor)),
                    updated_by: sea_orm::ActiveValue::Set(Some(actor)),
                    created_at: sea_orm::ActiveValue::Set(now),
                    updated_at: sea_orm::ActiveValue::Set(now),
                }
            }

            fn apply(
                model: Model,
                input: Input,
                actor: i32,
                now: sea_orm::prelude::DateTimeWithTimeZone,
            ) -> ActiveModel {
                let mut active: ActiveModel = model.into();
                $(active.$field = sea_orm::ActiveValue::Set(input.$field);)*
                active.updated_by = sea_orm::ActiveValue::Set(Some(actor));
                active.updated_at = sea_orm::ActiveValue::Set(now);
                active
            }

            fn id_of(model: &Model) -> i32 {
                model.id
            }
        }
    };
}

pub(crate) use master_table;
