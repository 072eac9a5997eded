//! `SeaORM` Entity for currencies table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    pub status: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Writable fields of a currency.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

super::master::master_table! {
    table: "currencies",
    path: "/master/currency",
    search: [Code, Name],
    fields: [code, name, symbol],
}
