//! `SeaORM` Entity for machine_revisions table.
//!
//! Revision history of a machine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "machine_revisions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub machine_id: i32,
    pub revision: String,
    pub notes: Option<String>,
    pub status: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::machines::Entity",
        from = "Column::MachineId",
        to = "super::machines::Column::Id"
    )]
    Machines,
}

impl Related<super::machines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Writable fields of a machine revision.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub machine_id: i32,
    pub revision: String,
    #[serde(default)]
    pub notes: Option<String>,
}

super::master::master_table! {
    table: "machine_revisions",
    path: "/master/machine-revision",
    search: [Revision, Notes],
    fields: [machine_id, revision, notes],
}
