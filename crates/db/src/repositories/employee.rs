//! Local mirror of the ERP employee roster.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};
use serde::Serialize;
use tracing::info;

use foundry_core::sync::{EMPLOYEE_ACTIVE, EMPLOYEE_INACTIVE, LocalEmployee, SyncPlan};

use crate::entities::employees;

/// Counts of rows written by one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Newly created employees.
    pub inserted: usize,
    /// Employees whose fields changed or that came back.
    pub updated: usize,
    /// Employees marked inactive.
    pub deactivated: usize,
    /// Remote entries ignored.
    pub skipped: usize,
}

/// Employee sync repository.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    db: DatabaseConnection,
}

impl EmployeeRepository {
    /// Creates a new employee repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads every local employee.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load_local(&self) -> Result<Vec<LocalEmployee>, DbErr> {
        Ok(employees::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(LocalEmployee::from)
            .collect())
    }

    /// Writes a sync plan in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; nothing is applied then.
    pub async fn apply_plan(&self, plan: SyncPlan) -> Result<SyncReport, DbErr> {
        let report = SyncReport {
            inserted: plan.inserts.len(),
            updated: plan.updates.len(),
            deactivated: plan.deactivations.len(),
            skipped: plan.skipped,
        };
        if plan.is_empty() {
            return Ok(report);
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        for remote in plan.inserts {
            employees::ActiveModel {
                employee_number: Set(remote.employee_number),
                name: Set(remote.name),
                email: Set(remote.email),
                department_code: Set(remote.department_code),
                position: Set(remote.position),
                status: Set(EMPLOYEE_ACTIVE.to_string()),
                created_by: Set(None),
                updated_by: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        for (id, remote) in plan.updates {
            employees::ActiveModel {
                id: Set(id),
                name: Set(remote.name),
                email: Set(remote.email),
                department_code: Set(remote.department_code),
                position: Set(remote.position),
                status: Set(EMPLOYEE_ACTIVE.to_string()),
                updated_at: Set(now.into()),
                ..Default::default()
            }
            .update(&txn)
            .await?;
        }

        if !plan.deactivations.is_empty() {
            employees::Entity::update_many()
                .col_expr(employees::Column::Status, Expr::value(EMPLOYEE_INACTIVE))
                .col_expr(employees::Column::UpdatedAt, Expr::value(now))
                .filter(employees::Column::Id.is_in(plan.deactivations))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        info!(
            inserted = report.inserted,
            updated = report.updated,
            deactivated = report.deactivated,
            "Employee roster applied"
        );
        Ok(report)
    }
}
