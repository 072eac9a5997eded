//! `SeaORM` Entity for role_permissions table.
//!
//! A row exists only while at least one bit is set.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use foundry_core::access::PermissionBits;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role_permissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub role_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub menu_id: i32,
    pub is_create: bool,
    pub is_update: bool,
    pub is_delete: bool,
}

impl Model {
    /// The row's bits.
    #[must_use]
    pub const fn bits(&self) -> PermissionBits {
        PermissionBits::new(self.is_create, self.is_update, self.is_delete)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id",
        on_delete = "Cascade"
    )]
    Roles,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
