//! `SeaORM` Entity for departments table.
//!
//! Departments; users reference them for their profile.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub status: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Writable fields of a department.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub code: String,
    pub name: String,
}

super::master::master_table! {
    table: "departments",
    path: "/master/department",
    search: [Code, Name],
    fields: [code, name],
}
