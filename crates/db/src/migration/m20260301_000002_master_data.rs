//! Master-data tables.
//!
//! Every table shares `id`, `status` and the audit columns; only the
//! entity fields differ, so columns are named with `Alias`.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_identity::{created_at, drop_table, pk};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn string(name: &str, len: u32) -> ColumnDef {
    ColumnDef::new(Alias::new(name)).string_len(len).not_null().to_owned()
}

fn optional_string(name: &str, len: u32) -> ColumnDef {
    ColumnDef::new(Alias::new(name)).string_len(len).null().to_owned()
}

fn integer(name: &str) -> ColumnDef {
    ColumnDef::new(Alias::new(name)).integer().not_null().to_owned()
}

fn optional_integer(name: &str) -> ColumnDef {
    ColumnDef::new(Alias::new(name)).integer().null().to_owned()
}

fn code() -> ColumnDef {
    string("code", 50)
}

fn name() -> ColumnDef {
    string("name", 255)
}

/// Table layout: name, entity columns, and the unique column if any.
fn tables() -> Vec<(&'static str, Vec<ColumnDef>, Option<&'static str>)> {
    vec![
        ("departments", vec![code(), name()], Some("code")),
        (
            "banks",
            vec![code(), name(), optional_string("swift_code", 11)],
            Some("code"),
        ),
        (
            "currencies",
            vec![code(), name(), optional_string("symbol", 10)],
            Some("code"),
        ),
        (
            "accounts",
            vec![
                code(),
                name(),
                string("account_type", 50),
                optional_integer("parent_id"),
            ],
            Some("code"),
        ),
        ("item_categories", vec![code(), name()], Some("code")),
        ("item_groups", vec![code(), name()], Some("code")),
        (
            "products",
            vec![code(), name(), optional_integer("item_category_id")],
            Some("code"),
        ),
        (
            "items",
            vec![
                code(),
                name(),
                string("unit", 20),
                optional_integer("item_group_id"),
                optional_integer("item_category_id"),
            ],
            Some("code"),
        ),
        (
            "buildings",
            vec![code(), name(), optional_string("address", 500)],
            Some("code"),
        ),
        (
            "machines",
            vec![code(), name(), optional_integer("building_id")],
            Some("code"),
        ),
        (
            "machine_revisions",
            vec![
                integer("machine_id"),
                string("revision", 50),
                ColumnDef::new(Alias::new("notes")).text().null().to_owned(),
            ],
            None,
        ),
        (
            "materials",
            vec![code(), name(), string("unit", 20)],
            Some("code"),
        ),
        (
            "warehouses",
            vec![code(), name(), optional_integer("building_id")],
            Some("code"),
        ),
        (
            "tax_codes",
            vec![code(), name(), integer("rate_bps")],
            Some("code"),
        ),
        (
            "employees",
            vec![
                string("employee_number", 50),
                name(),
                optional_string("email", 255),
                optional_string("department_code", 50),
                optional_string("position", 100),
            ],
            Some("employee_number"),
        ),
        (
            "reasons",
            vec![
                integer("menu_id"),
                string("key", 50),
                code(),
                string("description", 255),
            ],
            None,
        ),
    ]
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, columns, unique) in tables() {
            let mut create = Table::create();
            create
                .table(Alias::new(table))
                .if_not_exists()
                .col(pk(Alias::new("id")));
            for column in columns {
                create.col(column);
            }
            create
                .col(string("status", 50))
                .col(optional_integer("created_by"))
                .col(optional_integer("updated_by"))
                .col(created_at(Alias::new("created_at")))
                .col(created_at(Alias::new("updated_at")));
            manager.create_table(create).await?;

            if let Some(column) = unique {
                manager
                    .create_index(
                        Index::create()
                            .name(format!("uq_{table}_{column}"))
                            .table(Alias::new(table))
                            .col(Alias::new(column))
                            .unique()
                            .to_owned(),
                    )
                    .await?;
            }
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_machine_revisions_machine")
                    .table(Alias::new("machine_revisions"))
                    .col(Alias::new("machine_id"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reasons_menu_key")
                    .table(Alias::new("reasons"))
                    .col(Alias::new("menu_id"))
                    .col(Alias::new("key"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, _, _) in tables().into_iter().rev() {
            drop_table(manager, Alias::new(table)).await?;
        }
        Ok(())
    }
}
