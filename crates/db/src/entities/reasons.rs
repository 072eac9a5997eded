//! `SeaORM` Entity for reasons table.
//!
//! Controlled vocabulary for status-change flows, scoped by menu and key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reasons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub menu_id: i32,
    pub key: String,
    pub code: String,
    pub description: String,
    pub status: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Writable fields of a reason.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub menu_id: i32,
    pub key: String,
    pub code: String,
    pub description: String,
}

super::master::master_table! {
    table: "reasons",
    path: "/master/reason",
    search: [Key, Code, Description],
    fields: [menu_id, key, code, description],
}
