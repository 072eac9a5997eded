//! `SeaORM` Entity for approval_users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub approval_definition_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_definitions::Entity",
        from = "Column::ApprovalDefinitionId",
        to = "super::approval_definitions::Column::Id",
        on_delete = "Cascade"
    )]
    ApprovalDefinitions,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::approval_definitions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalDefinitions.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
