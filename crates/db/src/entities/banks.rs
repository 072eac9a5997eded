//! `SeaORM` Entity for banks table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "banks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub swift_code: Option<String>,
    pub status: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Writable fields of a bank.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub swift_code: Option<String>,
}

super::master::master_table! {
    table: "banks",
    path: "/master/bank",
    search: [Code, Name, SwiftCode],
    fields: [code, name, swift_code],
}
