//! Shared setup for repository integration tests.

#![allow(dead_code)]

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use foundry_db::Migrator;
use foundry_db::entities::{menus, users};
use foundry_db::repositories::{MenuRepository, UserRepository};
use foundry_shared::types::{MenuInput, UserInput};

/// Fresh in-memory database with every migration applied.
pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open sqlite");
    Migrator::up(&db, None).await.expect("Failed to migrate");
    db
}

pub fn user_input(username: &str) -> UserInput {
    UserInput {
        username: username.to_string(),
        name: format!("{username} test"),
        email: Some(format!("{username}@example.com")),
        password: None,
        department_id: None,
        employee_id: None,
        is_active: true,
        role_ids: vec![],
    }
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> users::Model {
    UserRepository::new(db.clone())
        .create(user_input(username), "$argon2id$test_hash".to_string(), 1)
        .await
        .expect("Failed to create user")
        .user
}

pub async fn create_menu(
    db: &DatabaseConnection,
    label: &str,
    path: &str,
    parent_id: i32,
) -> menus::Model {
    MenuRepository::new(db.clone())
        .create(MenuInput {
            label: label.to_string(),
            path: path.to_string(),
            parent_id,
            sort: 0,
            icon: None,
        })
        .await
        .expect("Failed to create menu")
}
