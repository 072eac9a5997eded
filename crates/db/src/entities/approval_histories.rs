//! `SeaORM` Entity for approval_histories table (append-only).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_histories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub approval_definition_id: i32,
    pub ref_table: String,
    pub ref_id: i32,
    pub key: String,
    pub message: Option<String>,
    pub created_by: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
