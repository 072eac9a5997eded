//! `SeaORM` Entity for items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub unit: String,
    pub item_group_id: Option<i32>,
    pub item_category_id: Option<i32>,
    pub status: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Writable fields of a item.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub code: String,
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub item_group_id: Option<i32>,
    #[serde(default)]
    pub item_category_id: Option<i32>,
}

super::master::master_table! {
    table: "items",
    path: "/master/item",
    search: [Code, Name, Unit],
    fields: [code, name, unit, item_group_id, item_category_id],
}
