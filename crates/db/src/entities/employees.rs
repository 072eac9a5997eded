//! `SeaORM` Entity for employees table.
//!
//! Mirrored from the ERP by the scheduled sync; `employee_number` is the
//! natural key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub employee_number: String,
    pub name: String,
    pub email: Option<String>,
    pub department_code: Option<String>,
    pub position: Option<String>,
    pub status: String,
    pub created_by: Option<i32>,
    pub updated_by: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for foundry_core::sync::LocalEmployee {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            employee_number: model.employee_number,
            name: model.name,
            email: model.email,
            department_code: model.department_code,
            position: model.position,
            status: model.status,
        }
    }
}

/// Writable fields of an employee.
#[derive(Debug, Clone, Deserialize)]
pub struct Input {
    pub employee_number: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department_code: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

super::master::master_table! {
    table: "employees",
    path: "/master/employee",
    search: [EmployeeNumber, Name, Email, Position],
    fields: [employee_number, name, email, department_code, position],
}
