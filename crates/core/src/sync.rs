//! Reconciliation of local employees against the ERP roster.

use std::collections::{HashMap, HashSet};

use foundry_shared::erp::RemoteEmployee;

/// Status of an employee present in the ERP.
pub const EMPLOYEE_ACTIVE: &str = "active";

/// Status of an employee the ERP no longer lists.
pub const EMPLOYEE_INACTIVE: &str = "inactive";

/// The fields of a local employee row the sync compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEmployee {
    /// Row ID.
    pub id: i32,
    /// Employee number.
    pub employee_number: String,
    /// Full name.
    pub name: String,
    /// Email.
    pub email: Option<String>,
    /// Department code.
    pub department_code: Option<String>,
    /// Job title.
    pub position: Option<String>,
    /// Row status.
    pub status: String,
}

/// Writes needed to mirror the ERP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Employees new to the local table.
    pub inserts: Vec<RemoteEmployee>,
    /// `(row id, remote data)` for rows whose fields differ or that come back.
    pub updates: Vec<(i32, RemoteEmployee)>,
    /// Row IDs to mark inactive.
    pub deactivations: Vec<i32>,
    /// Remote entries skipped for a blank or repeated number.
    pub skipped: usize,
}

impl SyncPlan {
    /// Whether applying the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deactivations.is_empty()
    }
}

fn differs(local: &LocalEmployee, remote: &RemoteEmployee) -> bool {
    local.name != remote.name
        || local.email != remote.email
        || local.department_code != remote.department_code
        || local.position != remote.position
        || local.status != EMPLOYEE_ACTIVE
}

/// Plans the upsert-by-number plus deactivation of missing employees.
///
/// The first remote entry wins when a number repeats.
#[must_use]
pub fn plan(local: &[LocalEmployee], remote: &[RemoteEmployee]) -> SyncPlan {
    let by_number: HashMap<&str, &LocalEmployee> = local
        .iter()
        .map(|e| (e.employee_number.as_str(), e))
        .collect();

    let mut plan = SyncPlan::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for employee in remote {
        let number = employee.employee_number.trim();
        if number.is_empty() || !seen.insert(number) {
            plan.skipped += 1;
            continue;
        }
        let normalized = RemoteEmployee {
            employee_number: number.to_string(),
            ..employee.clone()
        };
        match by_number.get(number) {
            Some(existing) if differs(existing, &normalized) => {
                plan.updates.push((existing.id, normalized));
            }
            Some(_) => {}
            None => plan.inserts.push(normalized),
        }
    }

    plan.deactivations = local
        .iter()
        .filter(|e| e.status != EMPLOYEE_INACTIVE && !seen.contains(e.employee_number.as_str()))
        .map(|e| e.id)
        .collect();

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(number: &str, name: &str) -> RemoteEmployee {
        RemoteEmployee {
            employee_number: number.to_string(),
            name: name.to_string(),
            email: None,
            department_code: None,
            position: None,
        }
    }

    fn local(id: i32, number: &str, name: &str, status: &str) -> LocalEmployee {
        LocalEmployee {
            id,
            employee_number: number.to_string(),
            name: name.to_string(),
            email: None,
            department_code: None,
            position: None,
            status: status.to_string(),
        }
    }

    #[test]
    fn test_plan_inserts_updates_and_deactivates() {
        let locals = vec![
            local(1, "E1", "Ana", "active"),
            local(2, "E2", "Budi", "active"),
            local(3, "E3", "Citra", "active"),
        ];
        let remotes = vec![remote("E1", "Ana"), remote("E2", "Budi S."), remote("E4", "Dewi")];

        let plan = plan(&locals, &remotes);

        assert_eq!(plan.inserts, vec![remote("E4", "Dewi")]);
        assert_eq!(plan.updates, vec![(2, remote("E2", "Budi S."))]);
        assert_eq!(plan.deactivations, vec![3]);
    }

    #[test]
    fn test_returning_employee_reactivated() {
        let locals = vec![local(1, "E1", "Ana", "inactive")];
        let plan = plan(&locals, &[remote("E1", "Ana")]);
        assert_eq!(plan.updates.len(), 1);
        assert!(plan.deactivations.is_empty());
    }

    #[test]
    fn test_already_inactive_not_deactivated_again() {
        let locals = vec![local(1, "E1", "Ana", "inactive")];
        assert!(plan(&locals, &[]).is_empty());
    }

    #[test]
    fn test_blank_and_duplicate_numbers_skipped() {
        let plan = plan(&[], &[remote(" ", "Nobody"), remote("E9", "First"), remote("E9", "Second")]);
        assert_eq!(plan.inserts, vec![remote("E9", "First")]);
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn test_numbers_trimmed() {
        let locals = vec![local(1, "E1", "Ana", "active")];
        let plan = plan(&locals, &[remote(" E1 ", "Ana")]);
        assert!(plan.is_empty());
    }
}
