//! Database seeder for Foundry development.
//!
//! Seeds the menu catalog, an `administrator` role that sees every menu with
//! every permission bit, and an `admin` user holding that role. Running it
//! again leaves existing rows in place.
//!
//! Usage: cargo run --bin seeder
//!
//! The admin password is read from `FOUNDRY_SEED_ADMIN_PASSWORD`.

use anyhow::Context;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use foundry_core::access::PermissionBits;
use foundry_core::auth::hash_password;
use foundry_db::UserRepository;
use foundry_db::entities::{APPROVABLE_TABLES, menus, roles, user_roles};
use foundry_db::repositories::{MenuRepository, PermissionRepository, RoleRepository};
use foundry_shared::AppConfig;
use foundry_shared::types::{MenuInput, RoleInput, UserInput};

const ADMIN_ROLE: &str = "administrator";
const ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "foundry-admin";

/// Menus besides the master tables, `(label, path)`.
const SYSTEM_MENUS: &[(&str, &str)] = &[
    ("User", "/master/user"),
    ("Role", "/master/role"),
    ("Menu", "/master/menu"),
    ("Role Permission", "/role-permission"),
    ("Approval", "/approval"),
    ("Activity Log", "/log"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = foundry_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding menus...");
    let menu_ids = seed_menus(&db).await?;

    println!("Seeding administrator role...");
    let role_id = seed_admin_role(&db, &menu_ids).await?;

    println!("Seeding admin user...");
    seed_admin_user(&db, role_id).await?;

    println!("Seeding complete!");
    Ok(())
}

/// `/master/item-category` becomes `Item Category`.
fn label_of(path: &str) -> String {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn ensure_menu(
    db: &DatabaseConnection,
    label: &str,
    path: &str,
    parent_id: i32,
    sort: i32,
) -> anyhow::Result<i32> {
    if let Some(existing) = menus::Entity::find()
        .filter(menus::Column::Path.eq(path))
        .one(db)
        .await?
    {
        println!("  Menu {path} already exists, skipping...");
        return Ok(existing.id);
    }

    let menu = MenuRepository::new(db.clone())
        .create(MenuInput {
            label: label.to_string(),
            path: path.to_string(),
            parent_id,
            sort,
            icon: None,
        })
        .await?;
    Ok(menu.id)
}

/// Master tables under a `/master` group; everything else at the top level.
async fn seed_menus(db: &DatabaseConnection) -> anyhow::Result<Vec<i32>> {
    let master = ensure_menu(db, "Master", "/master", 0, 1).await?;
    let mut ids = vec![master];

    let (grouped, top_level): (Vec<&(&str, &str)>, Vec<&(&str, &str)>) = SYSTEM_MENUS
        .iter()
        .partition(|(_, path)| path.starts_with("/master/"));

    let children = grouped
        .into_iter()
        .map(|(label, path)| ((*label).to_string(), *path))
        .chain(APPROVABLE_TABLES.iter().map(|(_, path)| (label_of(path), *path)));
    for (sort, (label, path)) in (1..).zip(children) {
        ids.push(ensure_menu(db, &label, path, master, sort).await?);
    }

    for (sort, (label, path)) in (2..).zip(top_level) {
        ids.push(ensure_menu(db, label, path, 0, sort).await?);
    }

    Ok(ids)
}

async fn seed_admin_role(db: &DatabaseConnection, menu_ids: &[i32]) -> anyhow::Result<i32> {
    let input = RoleInput {
        name: ADMIN_ROLE.to_string(),
        description: Some("Full access to every menu".to_string()),
        menu_ids: menu_ids.to_vec(),
    };

    let repo = RoleRepository::new(db.clone());
    let existing = roles::Entity::find()
        .filter(roles::Column::Name.eq(ADMIN_ROLE))
        .one(db)
        .await?;
    let role_id = match existing {
        Some(role) => repo.update(role.id, input).await?.role.id,
        None => repo.create(input).await?.role.id,
    };

    let permissions = PermissionRepository::new(db.clone());
    for menu_id in menu_ids {
        permissions
            .upsert(role_id, *menu_id, PermissionBits::ALL)
            .await?;
    }
    Ok(role_id)
}

async fn seed_admin_user(db: &DatabaseConnection, role_id: i32) -> anyhow::Result<()> {
    let users = UserRepository::new(db.clone());

    if let Some(user) = users.find_by_username(ADMIN_USERNAME).await? {
        println!("  Admin user already exists, ensuring role...");
        let linked = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(user.id))
            .filter(user_roles::Column::RoleId.eq(role_id))
            .one(db)
            .await?;
        if linked.is_none() {
            user_roles::ActiveModel {
                user_id: Set(user.id),
                role_id: Set(role_id),
            }
            .insert(db)
            .await?;
        }
        return Ok(());
    }

    let password = std::env::var("FOUNDRY_SEED_ADMIN_PASSWORD").unwrap_or_else(|_| {
        println!("  FOUNDRY_SEED_ADMIN_PASSWORD not set, using the development default");
        DEFAULT_ADMIN_PASSWORD.to_string()
    });
    let hash = hash_password(&password).context("Failed to hash admin password")?;

    users
        .create(
            UserInput {
                username: ADMIN_USERNAME.to_string(),
                name: "Administrator".to_string(),
                email: None,
                password: None,
                department_id: None,
                employee_id: None,
                is_active: true,
                role_ids: vec![role_id],
            },
            hash,
            0,
        )
        .await?;
    Ok(())
}
