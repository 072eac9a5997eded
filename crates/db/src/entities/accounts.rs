//! `SeaORM` Entity for accounts table.
//!
//! Chart of accounts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub parent_id: Option<i32>,
    pub status: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Writable fields of a account.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub code: String,
    pub name: String,
    pub account_type: String,
    #[serde(default)]
    pub parent_id: Option<i32>,
}

super::master::master_table! {
    table: "accounts",
    path: "/master/account",
    search: [Code, Name, AccountType],
    fields: [code, name, account_type, parent_id],
}
