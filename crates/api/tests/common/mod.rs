//! Shared setup for HTTP tests: an in-memory database behind the full router.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;

use foundry_api::throttle::ResetThrottle;
use foundry_api::{AppState, create_router};
use foundry_core::access::PermissionBits;
use foundry_core::auth::hash_password;
use foundry_db::Migrator;
use foundry_db::entities::{menus, user_roles, users};
use foundry_db::repositories::{MenuRepository, PermissionRepository, RoleRepository};
use foundry_db::UserRepository;
use foundry_shared::config::{
    AppConfig, AuthConfig, DatabaseConfig, EmailConfig, ErpConfig, JwtSettings, ServerConfig,
    SyncConfig,
};
use foundry_shared::email::EmailService;
use foundry_shared::erp::{EmployeeSource, ErpError, RemoteEmployee};
use foundry_shared::jwt::{JwtConfig, JwtService};
use foundry_shared::types::{MenuInput, RoleInput, UserInput};

pub const PASSWORD: &str = "correct-horse-battery";

/// A fixed ERP roster.
pub struct StaticRoster(pub Vec<RemoteEmployee>);

#[async_trait]
impl EmployeeSource for StaticRoster {
    async fn fetch_employees(&self) -> Result<Vec<RemoteEmployee>, ErpError> {
        Ok(self.0.clone())
    }
}

pub fn config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtSettings {
            secret: "test-secret".to_string(),
            access_token_expiry_secs: 900,
            refresh_token_expiry_secs: 3600,
        },
        auth: AuthConfig::default(),
        email: EmailConfig::default(),
        erp: ErpConfig::default(),
        sync: SyncConfig::default(),
    }
}

pub struct TestApp {
    pub db: DatabaseConnection,
    pub router: Router,
}

pub async fn app_with_roster(roster: Vec<RemoteEmployee>) -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open sqlite");
    Migrator::up(&db, None).await.expect("Failed to migrate");

    let config = config();
    let reset_throttle = ResetThrottle::new(config.auth.password_reset_throttle_secs);
    let state = AppState {
        db: Arc::new(db.clone()),
        jwt_service: Arc::new(JwtService::new(JwtConfig::from(&config.jwt))),
        email_service: Arc::new(EmailService::new(config.email.clone())),
        config: Arc::new(config),
        erp: Arc::new(StaticRoster(roster)),
        reset_throttle,
    };

    TestApp {
        db,
        router: create_router(state),
    }
}

pub async fn app() -> TestApp {
    app_with_roster(vec![]).await
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> Reply {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("/api/v1{uri}"))
            .header(header::USER_AGENT, "Mozilla/5.0 (X11; Linux x86_64)")
            .header("x-forwarded-for", "203.0.113.9");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> Reply {
        self.send(Method::GET, uri, Some(token), None, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.send(Method::POST, uri, token, Some(body), None).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.send(Method::PUT, uri, Some(token), Some(body), None).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Reply {
        self.send(Method::DELETE, uri, Some(token), None, None).await
    }

    /// Logs in and returns the access token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let reply = self
            .post(
                "/login",
                None,
                serde_json::json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "login failed: {}", reply.body);
        reply.body["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }
}

/// Creates an active user whose password is [`PASSWORD`].
pub async fn create_user(db: &DatabaseConnection, username: &str) -> users::Model {
    let hash = hash_password(PASSWORD).expect("hash");
    UserRepository::new(db.clone())
        .create(
            UserInput {
                username: username.to_string(),
                name: format!("{username} test"),
                email: Some(format!("{username}@example.com")),
                password: None,
                department_id: None,
                employee_id: None,
                is_active: true,
                role_ids: vec![],
            },
            hash,
            1,
        )
        .await
        .expect("Failed to create user")
        .user
}

pub async fn create_menu(db: &DatabaseConnection, path: &str) -> menus::Model {
    MenuRepository::new(db.clone())
        .create(MenuInput {
            label: path.to_string(),
            path: path.to_string(),
            parent_id: 0,
            sort: 0,
            icon: None,
        })
        .await
        .expect("Failed to create menu")
}

static ROLE_SEQ: AtomicU32 = AtomicU32::new(1);

/// Gives `user_id` a fresh role that sees `grants` with the given bits.
pub async fn grant(db: &DatabaseConnection, user_id: i32, grants: &[(&menus::Model, PermissionBits)]) {
    let role = RoleRepository::new(db.clone())
        .create(RoleInput {
            name: format!("role-{}", ROLE_SEQ.fetch_add(1, Ordering::Relaxed)),
            description: None,
            menu_ids: grants.iter().map(|(menu, _)| menu.id).collect(),
        })
        .await
        .expect("Failed to create role")
        .role;

    let permissions = PermissionRepository::new(db.clone());
    for (menu, bits) in grants {
        permissions
            .upsert(role.id, menu.id, *bits)
            .await
            .expect("Failed to grant");
    }

    user_roles::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role.id),
    }
    .insert(db)
    .await
    .expect("Failed to assign role");
}

pub const ALL: PermissionBits = PermissionBits::new(true, true, true);
pub const VIEW: PermissionBits = PermissionBits::new(false, false, false);
