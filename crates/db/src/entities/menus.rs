//! `SeaORM` Entity for menus table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use foundry_core::access::MenuRecord;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menus")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub label: String,
    #[sea_orm(unique)]
    pub path: String,
    pub parent_id: i32,
    pub sort: i32,
    pub icon: Option<String>,
    pub is_delete: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MenuRecord {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            label: model.label,
            path: model.path,
            parent_id: model.parent_id,
            sort: model.sort,
            is_delete: model.is_delete,
        }
    }
}
