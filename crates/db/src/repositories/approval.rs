//! Approval repository: chain definitions, the per-record walk, and the
//! notification, structure and history views.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::{Alias, Expr, Order, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info};

use foundry_core::approval::{
    ACTIVE, Approval, ApprovalEngine, ApprovalError, CREATE_ACTION, ChainLevel, LevelDraft,
    NextStep, Outcome, PENDING,
};

use crate::entities::{
    approval_definitions, approval_histories, approval_users, menus, path_for_table,
    table_for_path, users,
};

/// Status a new record of the table behind `path` starts with.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn initial_status<C>(conn: &C, path: &str) -> Result<&'static str, DbErr>
where
    C: ConnectionTrait,
{
    let levels = approval_definitions::Entity::find()
        .join(JoinType::InnerJoin, approval_definitions::Relation::Menus.def())
        .filter(menus::Column::Path.eq(path))
        .filter(approval_definitions::Column::Action.eq(CREATE_ACTION))
        .count(conn)
        .await?;

    Ok(if levels > 0 { PENDING } else { ACTIVE })
}

/// One stored definition with its approvers.
#[derive(Debug, Clone, Serialize)]
pub struct ChainView {
    /// Definition ID.
    pub id: i32,
    /// Menu ID.
    pub menu_id: i32,
    /// Menu path.
    pub menu_path: String,
    /// Chain action.
    pub action: String,
    /// Level number.
    pub level: i32,
    /// Status set on completion.
    pub status: String,
    /// Approvals required.
    pub count: i32,
    /// Approver user IDs.
    pub approvers: Vec<i32>,
}

/// A user as shown in approval views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApproverInfo {
    /// User ID.
    pub id: i32,
    /// Login name.
    pub username: String,
    /// Display name.
    pub name: String,
}

/// One chain level seen by a user.
#[derive(Debug, Clone, Serialize)]
pub struct StructureLevel {
    /// Definition ID.
    pub definition_id: i32,
    /// Chain action.
    pub action: String,
    /// Level number.
    pub level: i32,
    /// Status set on completion.
    pub status: String,
    /// Approvals required.
    pub count: i32,
    /// Eligible approvers.
    pub approvers: Vec<ApproverInfo>,
    /// Whether the viewing user is among the approvers.
    pub involved: bool,
}

/// A record waiting on the viewing user.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalNotification {
    /// Table of the record.
    pub ref_table: String,
    /// Record ID.
    pub ref_id: i32,
    /// Menu path of the table.
    pub menu_path: String,
    /// Current record status.
    pub status: String,
    /// The step awaiting the user.
    #[serde(flatten)]
    pub step: NextStep,
}

/// One history row, resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// History row ID.
    pub id: i32,
    /// Definition acted on.
    pub approval_definition_id: i32,
    /// Level of that definition, `None` once it was replaced.
    pub level: Option<i32>,
    /// Chain action.
    pub key: String,
    /// Comment left by the approver.
    pub message: Option<String>,
    /// Acting user.
    pub created_by: i32,
    /// Acting user's display name.
    pub created_by_name: Option<String>,
    /// When the action was taken.
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

/// Input for acting on a record.
#[derive(Debug, Clone)]
pub struct ActInput {
    /// Table of the record.
    pub ref_table: String,
    /// Record ID.
    pub ref_id: i32,
    /// Chain action to walk.
    pub action: String,
    /// Level the caller believes is next, if pinned.
    pub level: Option<i32>,
    /// Approver's comment.
    pub message: Option<String>,
}

/// Result of acting on a record.
#[derive(Debug, Clone, Serialize)]
pub struct ActResult {
    /// Record ID.
    pub ref_id: i32,
    /// Record status after the action.
    pub status: String,
    /// What the action did.
    #[serde(flatten)]
    pub outcome: Outcome,
}

fn db_err(e: DbErr) -> ApprovalError {
    ApprovalError::Database(e.to_string())
}

async fn menu_by_path<C>(conn: &C, path: &str) -> Result<menus::Model, ApprovalError>
where
    C: ConnectionTrait,
{
    menus::Entity::find()
        .filter(menus::Column::Path.eq(path))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ApprovalError::MenuNotFound(path.to_string()))
}

async fn approvers_of<C>(conn: &C, definition_ids: &[i32]) -> Result<HashMap<i32, Vec<i32>>, DbErr>
where
    C: ConnectionTrait,
{
    let rows = approval_users::Entity::find()
        .filter(approval_users::Column::ApprovalDefinitionId.is_in(definition_ids.to_vec()))
        .order_by_asc(approval_users::Column::UserId)
        .all(conn)
        .await?;

    let mut map: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in rows {
        map.entry(row.approval_definition_id)
            .or_default()
            .push(row.user_id);
    }
    Ok(map)
}

/// Loads the chain for `(menu_id, action)` ordered by level.
async fn load_chain<C>(conn: &C, menu_id: i32, action: &str) -> Result<Vec<ChainLevel>, DbErr>
where
    C: ConnectionTrait,
{
    let definitions = approval_definitions::Entity::find()
        .filter(approval_definitions::Column::MenuId.eq(menu_id))
        .filter(approval_definitions::Column::Action.eq(action))
        .order_by_asc(approval_definitions::Column::Level)
        .all(conn)
        .await?;

    let ids: Vec<i32> = definitions.iter().map(|d| d.id).collect();
    let mut approvers = approvers_of(conn, &ids).await?;

    Ok(definitions
        .into_iter()
        .map(|d| ChainLevel {
            definition_id: d.id,
            level: d.level,
            action: d.action,
            status: d.status,
            count: d.count,
            approvers: approvers.remove(&d.id).unwrap_or_default(),
        })
        .collect())
}

/// Loads accepted actions for records of `table` under `action`, keyed by record.
async fn load_history<C>(
    conn: &C,
    table: &str,
    ref_ids: &[i32],
    action: &str,
) -> Result<HashMap<i32, Vec<Approval>>, DbErr>
where
    C: ConnectionTrait,
{
    let rows = approval_histories::Entity::find()
        .filter(approval_histories::Column::RefTable.eq(table))
        .filter(approval_histories::Column::RefId.is_in(ref_ids.to_vec()))
        .filter(approval_histories::Column::Key.eq(action))
        .order_by_asc(approval_histories::Column::Id)
        .all(conn)
        .await?;

    let mut map: HashMap<i32, Vec<Approval>> = HashMap::new();
    for row in rows {
        map.entry(row.ref_id).or_default().push(Approval {
            definition_id: row.approval_definition_id,
            user_id: row.created_by,
        });
    }
    Ok(map)
}

async fn user_infos<C>(conn: &C, ids: Vec<i32>) -> Result<HashMap<i32, ApproverInfo>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| {
            (
                u.id,
                ApproverInfo {
                    id: u.id,
                    username: u.username,
                    name: u.name,
                },
            )
        })
        .collect())
}

/// Approval repository.
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
}

impl ApprovalRepository {
    /// Creates a new approval repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists stored definitions, optionally for one menu.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::MenuNotFound` for an unknown path.
    pub async fn list_chains(&self, path: Option<&str>) -> Result<Vec<ChainView>, ApprovalError> {
        let mut query = approval_definitions::Entity::find();
        if let Some(path) = path {
            let menu = menu_by_path(&self.db, path).await?;
            query = query.filter(approval_definitions::Column::MenuId.eq(menu.id));
        }

        let definitions = query
            .order_by_asc(approval_definitions::Column::MenuId)
            .order_by_asc(approval_definitions::Column::Action)
            .order_by_asc(approval_definitions::Column::Level)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        self.views(definitions).await.map_err(db_err)
    }

    async fn views(
        &self,
        definitions: Vec<approval_definitions::Model>,
    ) -> Result<Vec<ChainView>, DbErr> {
        let ids: Vec<i32> = definitions.iter().map(|d| d.id).collect();
        let menu_ids: BTreeSet<i32> = definitions.iter().map(|d| d.menu_id).collect();
        let mut approvers = approvers_of(&self.db, &ids).await?;
        let paths: HashMap<i32, String> = menus::Entity::find()
            .filter(menus::Column::Id.is_in(menu_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id, m.path))
            .collect();

        Ok(definitions
            .into_iter()
            .map(|d| ChainView {
                id: d.id,
                menu_id: d.menu_id,
                menu_path: paths.get(&d.menu_id).cloned().unwrap_or_default(),
                action: d.action,
                level: d.level,
                status: d.status,
                count: d.count,
                approvers: approvers.remove(&d.id).unwrap_or_default(),
            })
            .collect())
    }

    /// Replaces every definition of the menu at `path` in one transaction.
    ///
    /// History rows keep pointing at the removed definitions, so records
    /// in flight restart at level 1 of the new chain. Records whose status
    /// is already terminal stay closed.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::InvalidChain` when the levels break the chain
    /// rules or name unknown users, `ApprovalError::MenuNotFound` for an
    /// unknown path.
    pub async fn replace_chain(
        &self,
        path: &str,
        levels: Vec<LevelDraft>,
        actor: i32,
    ) -> Result<Vec<ChainView>, ApprovalError> {
        ApprovalEngine::validate_chain(&levels)?;

        let wanted: BTreeSet<i32> = levels
            .iter()
            .flat_map(|l| l.approvers.iter().copied())
            .collect();
        let known = users::Entity::find()
            .filter(users::Column::Id.is_in(wanted.clone()))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        if known != u64::try_from(wanted.len()).unwrap_or(u64::MAX) {
            return Err(ApprovalError::InvalidChain(
                "approvers must be existing users".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let menu = menu_by_path(&txn, path).await?;

        let old_ids: Vec<i32> = approval_definitions::Entity::find()
            .filter(approval_definitions::Column::MenuId.eq(menu.id))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|d| d.id)
            .collect();
        approval_users::Entity::delete_many()
            .filter(approval_users::Column::ApprovalDefinitionId.is_in(old_ids))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        approval_definitions::Entity::delete_many()
            .filter(approval_definitions::Column::MenuId.eq(menu.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let now = Utc::now().into();
        for draft in &levels {
            let definition = approval_definitions::ActiveModel {
                menu_id: Set(menu.id),
                action: Set(draft.action.trim().to_string()),
                level: Set(draft.level),
                status: Set(draft.status.trim().to_string()),
                count: Set(draft.count),
                created_by: Set(Some(actor)),
                updated_by: Set(Some(actor)),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;

            let approvers: BTreeSet<i32> = draft.approvers.iter().copied().collect();
            for user_id in approvers {
                approval_users::ActiveModel {
                    approval_definition_id: Set(definition.id),
                    user_id: Set(user_id),
                }
                .insert(&txn)
                .await
                .map_err(db_err)?;
            }
        }

        txn.commit().await.map_err(db_err)?;
        info!(menu = %path, levels = levels.len(), "Approval chain replaced");

        self.list_chains(Some(path)).await
    }

    /// Deletes one definition and closes the gap in its chain.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::DefinitionNotFound` for an unknown ID.
    pub async fn delete_definition(&self, id: i32) -> Result<(), ApprovalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let definition = approval_definitions::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(ApprovalError::DefinitionNotFound(id))?;

        approval_users::Entity::delete_many()
            .filter(approval_users::Column::ApprovalDefinitionId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        approval_definitions::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let siblings: Vec<(i32, i32)> = approval_definitions::Entity::find()
            .filter(approval_definitions::Column::MenuId.eq(definition.menu_id))
            .filter(approval_definitions::Column::Action.eq(definition.action.as_str()))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|d| (d.id, d.level))
            .collect();

        let now = Utc::now().into();
        for (sibling, level) in ApprovalEngine::renumber_after_removal(&siblings, definition.level) {
            approval_definitions::ActiveModel {
                id: Set(sibling),
                level: Set(level),
                updated_at: Set(now),
                ..Default::default()
            }
            .update(&txn)
            .await
            .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        info!(definition_id = id, "Approval definition deleted");
        Ok(())
    }

    /// Approvers of one definition.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::DefinitionNotFound` for an unknown ID.
    pub async fn approvers(&self, definition_id: i32) -> Result<Vec<ApproverInfo>, ApprovalError> {
        approval_definitions::Entity::find_by_id(definition_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(ApprovalError::DefinitionNotFound(definition_id))?;

        let ids = approvers_of(&self.db, &[definition_id])
            .await
            .map_err(db_err)?
            .remove(&definition_id)
            .unwrap_or_default();
        let mut infos = user_infos(&self.db, ids.clone()).await.map_err(db_err)?;

        Ok(ids.into_iter().filter_map(|id| infos.remove(&id)).collect())
    }

    /// Acts on a record as `user_id`.
    ///
    /// Locks the record row for the whole transaction, refuses records whose
    /// status is terminal, re-derives the chain position from history, then
    /// writes history and status.
    ///
    /// # Errors
    ///
    /// Returns the engine's verdict errors (`AlreadyClosed`, `OutOfOrder`,
    /// `NotApprover`), plus `UnknownTable`, `RecordNotFound` and `NoChain`.
    pub async fn act(&self, input: ActInput, user_id: i32) -> Result<ActResult, ApprovalError> {
        let path = path_for_table(&input.ref_table)
            .ok_or_else(|| ApprovalError::UnknownTable(input.ref_table.clone()))?;
        let table = input.ref_table.as_str();

        let txn = self.db.begin().await.map_err(db_err)?;
        let backend = txn.get_database_backend();

        let mut select = Query::select();
        select
            .column(Alias::new("status"))
            .from(Alias::new(table))
            .and_where(Expr::col(Alias::new("id")).eq(input.ref_id));
        if backend != DbBackend::Sqlite {
            select.lock_exclusive();
        }
        let current: String = txn
            .query_one(backend.build(&select))
            .await
            .map_err(db_err)?
            .ok_or_else(|| ApprovalError::RecordNotFound {
                table: table.to_string(),
                id: input.ref_id,
            })?
            .try_get("", "status")
            .map_err(db_err)?;

        let menu = menu_by_path(&txn, path).await?;
        let chain = load_chain(&txn, menu.id, &input.action)
            .await
            .map_err(db_err)?;
        if chain.is_empty() {
            return Err(ApprovalError::NoChain {
                menu: path.to_string(),
                action: input.action,
            });
        }
        ApprovalEngine::ensure_open(&chain, &current)?;
        let history = load_history(&txn, table, &[input.ref_id], &input.action)
            .await
            .map_err(db_err)?
            .remove(&input.ref_id)
            .unwrap_or_default();

        let decision = ApprovalEngine::act(&chain, &history, user_id, input.level)?;
        let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();

        if decision.writes_history() {
            approval_histories::ActiveModel {
                approval_definition_id: Set(decision.definition_id),
                ref_table: Set(table.to_string()),
                ref_id: Set(input.ref_id),
                key: Set(input.action.clone()),
                message: Set(input.message),
                created_by: Set(user_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        let status = match decision.new_status() {
            Some(status) => {
                let update = Query::update()
                    .table(Alias::new(table))
                    .values([
                        (Alias::new("status"), status.into()),
                        (Alias::new("updated_by"), user_id.into()),
                        (Alias::new("updated_at"), now.into()),
                    ])
                    .and_where(Expr::col(Alias::new("id")).eq(input.ref_id))
                    .to_owned();
                txn.execute(backend.build(&update)).await.map_err(db_err)?;
                status.to_string()
            }
            None => current,
        };

        txn.commit().await.map_err(db_err)?;
        info!(
            table,
            ref_id = input.ref_id,
            user_id,
            outcome = ?decision.outcome,
            "Approval action recorded"
        );

        Ok(ActResult {
            ref_id: input.ref_id,
            status,
            outcome: decision.outcome,
        })
    }

    /// Records waiting on `user_id` across every approvable table.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn notifications(
        &self,
        user_id: i32,
    ) -> Result<Vec<ApprovalNotification>, ApprovalError> {
        let assigned: Vec<i32> = approval_users::Entity::find()
            .filter(approval_users::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|row| row.approval_definition_id)
            .collect();

        let chains: BTreeSet<(i32, String)> = approval_definitions::Entity::find()
            .filter(approval_definitions::Column::Id.is_in(assigned))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|d| (d.menu_id, d.action))
            .collect();

        let menu_ids: BTreeSet<i32> = chains.iter().map(|(menu_id, _)| *menu_id).collect();
        let paths: HashMap<i32, String> = menus::Entity::find()
            .filter(menus::Column::Id.is_in(menu_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|m| (m.id, m.path))
            .collect();

        let mut out = Vec::new();
        for (menu_id, action) in chains {
            let Some(path) = paths.get(&menu_id) else { continue };
            let Some(table) = table_for_path(path) else {
                debug!(menu = %path, "Chain on a menu without an approvable table");
                continue;
            };

            let chain = load_chain(&self.db, menu_id, &action)
                .await
                .map_err(db_err)?;
            let records = self
                .open_records(table, ApprovalEngine::open_statuses(&chain))
                .await
                .map_err(db_err)?;
            if records.is_empty() {
                continue;
            }

            let ids: Vec<i32> = records.iter().map(|(id, _)| *id).collect();
            let mut history = load_history(&self.db, table, &ids, &action)
                .await
                .map_err(db_err)?;

            for (ref_id, status) in records {
                let approvals = history.remove(&ref_id).unwrap_or_default();
                if let Some(step) = ApprovalEngine::pending_for(&chain, &approvals, user_id) {
                    out.push(ApprovalNotification {
                        ref_table: table.to_string(),
                        ref_id,
                        menu_path: path.clone(),
                        status,
                        step,
                    });
                }
            }
        }

        Ok(out)
    }

    async fn open_records(
        &self,
        table: &str,
        statuses: Vec<String>,
    ) -> Result<Vec<(i32, String)>, DbErr> {
        let backend = self.db.get_database_backend();
        let select = Query::select()
            .columns([Alias::new("id"), Alias::new("status")])
            .from(Alias::new(table))
            .and_where(Expr::col(Alias::new("status")).is_in(statuses))
            .order_by(Alias::new("id"), Order::Asc)
            .to_owned();

        let mut records = Vec::new();
        for row in self.db.query_all(backend.build(&select)).await? {
            let id: i32 = row.try_get("", "id")?;
            let status: String = row.try_get("", "status")?;
            records.push((id, status));
        }
        Ok(records)
    }

    /// Every chain level of the menu at `path`, marked where `user_id` takes part.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::MenuNotFound` for an unknown path.
    pub async fn structure(
        &self,
        user_id: i32,
        path: &str,
    ) -> Result<Vec<StructureLevel>, ApprovalError> {
        let menu = menu_by_path(&self.db, path).await?;
        let definitions = approval_definitions::Entity::find()
            .filter(approval_definitions::Column::MenuId.eq(menu.id))
            .order_by_asc(approval_definitions::Column::Action)
            .order_by_asc(approval_definitions::Column::Level)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let ids: Vec<i32> = definitions.iter().map(|d| d.id).collect();
        let mut approvers = approvers_of(&self.db, &ids).await.map_err(db_err)?;
        let user_ids: Vec<i32> = approvers.values().flatten().copied().collect();
        let infos = user_infos(&self.db, user_ids).await.map_err(db_err)?;

        Ok(definitions
            .into_iter()
            .map(|d| {
                let ids = approvers.remove(&d.id).unwrap_or_default();
                StructureLevel {
                    definition_id: d.id,
                    action: d.action,
                    level: d.level,
                    status: d.status,
                    count: d.count,
                    involved: ids.contains(&user_id),
                    approvers: ids.iter().filter_map(|id| infos.get(id).cloned()).collect(),
                }
            })
            .collect())
    }

    /// Approval history of one record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::UnknownTable` for a table outside approval control.
    pub async fn history(
        &self,
        table: &str,
        ref_id: i32,
    ) -> Result<Vec<HistoryEntry>, ApprovalError> {
        if path_for_table(table).is_none() {
            return Err(ApprovalError::UnknownTable(table.to_string()));
        }

        let rows = approval_histories::Entity::find()
            .filter(approval_histories::Column::RefTable.eq(table))
            .filter(approval_histories::Column::RefId.eq(ref_id))
            .order_by_asc(approval_histories::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let definition_ids: BTreeSet<i32> = rows.iter().map(|r| r.approval_definition_id).collect();
        let levels: HashMap<i32, i32> = approval_definitions::Entity::find()
            .filter(approval_definitions::Column::Id.is_in(definition_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|d| (d.id, d.level))
            .collect();
        let actors: HashSet<i32> = rows.iter().map(|r| r.created_by).collect();
        let infos = user_infos(&self.db, actors.into_iter().collect())
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| HistoryEntry {
                id: r.id,
                approval_definition_id: r.approval_definition_id,
                level: levels.get(&r.approval_definition_id).copied(),
                key: r.key,
                message: r.message,
                created_by: r.created_by,
                created_by_name: infos.get(&r.created_by).map(|u| u.name.clone()),
                created_at: r.created_at,
            })
            .collect())
    }
}
