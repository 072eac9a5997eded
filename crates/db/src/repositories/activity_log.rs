//! Append-only activity log.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Iterable, Set};
use serde::Deserialize;

use foundry_shared::types::{ListQuery, ListResponse};

use super::listing::{ListColumns, fetch_page};
use crate::entities::activity_logs;

/// A log line to append.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewActivity {
    /// Acting user, if known.
    #[serde(default)]
    pub user_id: Option<i32>,
    /// Client address.
    #[serde(default)]
    pub ip: Option<String>,
    /// What happened, e.g. `login`.
    pub action: String,
    /// Whether it succeeded.
    #[serde(default = "default_success")]
    pub is_success: bool,
    /// Free text.
    #[serde(default)]
    pub message: Option<String>,
    /// Raw `User-Agent`.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Operating system derived from the user agent.
    #[serde(default)]
    pub os: Option<String>,
}

const fn default_success() -> bool {
    true
}

/// Activity log repository.
#[derive(Debug, Clone)]
pub struct ActivityLogRepository {
    db: DatabaseConnection,
}

impl ActivityLogRepository {
    /// Creates a new activity log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record(&self, entry: NewActivity) -> Result<activity_logs::Model, DbErr> {
        activity_logs::ActiveModel {
            user_id: Set(entry.user_id),
            ip: Set(entry.ip),
            action: Set(entry.action),
            is_success: Set(entry.is_success),
            message: Set(entry.message),
            user_agent: Set(entry.user_agent),
            os: Set(entry.os),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// Lists entries; with no sort given, the oldest come first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, query: &ListQuery) -> Result<ListResponse<activity_logs::Model>, DbErr> {
        let columns = ListColumns {
            search: vec![
                activity_logs::Column::Action,
                activity_logs::Column::Message,
                activity_logs::Column::Ip,
            ],
            sort: activity_logs::Column::iter().collect(),
            id: activity_logs::Column::Id,
            updated_at: activity_logs::Column::CreatedAt,
        };
        fetch_page(&self.db, activity_logs::Entity::find(), query, &columns).await
    }
}
