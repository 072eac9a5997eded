//! `SeaORM` entity definitions.
//!
//! Identity, role graph and approval tables first, then the master-data
//! tables that share the [`master::MasterTable`] shape.

pub mod master;

pub mod activity_logs;
pub mod approval_definitions;
pub mod approval_histories;
pub mod approval_users;
pub mod menus;
pub mod password_resets;
pub mod role_menus;
pub mod role_permissions;
pub mod roles;
pub mod user_roles;
pub mod users;

pub mod accounts;
pub mod banks;
pub mod buildings;
pub mod currencies;
pub mod departments;
pub mod employees;
pub mod item_categories;
pub mod item_groups;
pub mod items;
pub mod machine_revisions;
pub mod machines;
pub mod materials;
pub mod products;
pub mod reasons;
pub mod tax_codes;
pub mod warehouses;

use master::MasterTable;

macro_rules! approvable {
    ($($module:ident),* $(,)?) => {
        /// `(table, menu path)` of every table whose records walk approval chains.
        pub const APPROVABLE_TABLES: &[(&str, &str)] = &[
            $((
                <$module::Entity as MasterTable>::TABLE,
                <$module::Entity as MasterTable>::MENU_PATH,
            )),*
        ];
    };
}

approvable!(
    accounts,
    banks,
    buildings,
    currencies,
    departments,
    employees,
    item_categories,
    item_groups,
    items,
    machine_revisions,
    machines,
    materials,
    products,
    reasons,
    tax_codes,
    warehouses,
);

/// Menu path gating an approvable table.
#[must_use]
pub fn path_for_table(table: &str) -> Option<&'static str> {
    APPROVABLE_TABLES
        .iter()
        .find(|(t, _)| *t == table)
        .map(|(_, path)| *path)
}

/// Approvable table behind a menu path.
#[must_use]
pub fn table_for_path(path: &str) -> Option<&'static str> {
    APPROVABLE_TABLES
        .iter()
        .find(|(_, p)| *p == path)
        .map(|(table, _)| *table)
}
