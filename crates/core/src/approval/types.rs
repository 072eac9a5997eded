//! Approval chain domain types.

use serde::{Deserialize, Serialize};

/// Conventional status of a record waiting on the first level.
pub const PENDING: &str = "pending";

/// Status of a record created under a menu without a create chain.
pub const ACTIVE: &str = "active";

/// Chain action gating record creation.
pub const CREATE_ACTION: &str = "create";

/// One level of a chain as stored, with its eligible approvers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLevel {
    /// Approval definition ID.
    pub definition_id: i32,
    /// 1-based position in the chain.
    pub level: i32,
    /// Chain action (also the history key).
    pub action: String,
    /// Status the record takes once this level completes.
    pub status: String,
    /// Distinct approvals needed.
    pub count: i32,
    /// Eligible user IDs.
    pub approvers: Vec<i32>,
}

impl ChainLevel {
    /// Approvals required, never less than one.
    #[must_use]
    pub fn required(&self) -> usize {
        usize::try_from(self.count.max(1)).unwrap_or(1)
    }

    /// Whether `user_id` may act at this level.
    #[must_use]
    pub fn is_approver(&self, user_id: i32) -> bool {
        self.approvers.contains(&user_id)
    }
}

/// An accepted action, reduced to what the engine needs from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Approval {
    /// Level acted on.
    pub definition_id: i32,
    /// Acting user.
    pub user_id: i32,
}

/// What an accepted action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// Same user already acted at this level; nothing written.
    Duplicate {
        /// Level number.
        level: i32,
    },
    /// History written, level still short of its count.
    Recorded {
        /// Level number.
        level: i32,
        /// Distinct approvals including this one.
        approvals: usize,
        /// Approvals required.
        required: usize,
    },
    /// History written and the level completed.
    Advanced {
        /// Level number.
        level: i32,
        /// New record status.
        status: String,
        /// Whether this was the last level.
        closed: bool,
    },
}

/// The engine's verdict for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Definition the history row points at.
    pub definition_id: i32,
    /// Effect of the action.
    pub outcome: Outcome,
}

impl Decision {
    /// Whether a history row must be written.
    #[must_use]
    pub const fn writes_history(&self) -> bool {
        !matches!(self.outcome, Outcome::Duplicate { .. })
    }

    /// Status to store on the record, if it changes.
    #[must_use]
    pub fn new_status(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Advanced { status, .. } => Some(status),
            _ => None,
        }
    }
}

/// The pending step of an open record, as shown in notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextStep {
    /// Last completed level, 0 when none.
    pub current_level: i32,
    /// Status set by the last completed level, `None` when none completed.
    pub current_status: Option<String>,
    /// Level awaiting approval.
    pub next_level: i32,
    /// Status that level will set.
    pub next_status: String,
    /// Chain action.
    pub next_action: String,
    /// Approvals that level needs.
    pub next_count: i32,
    /// Approvals already given at that level.
    pub next_approvals: usize,
}

/// A level as submitted when editing a chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelDraft {
    /// Chain action.
    pub action: String,
    /// 1-based level.
    pub level: i32,
    /// Status set on completion.
    pub status: String,
    /// Distinct approvals needed.
    pub count: i32,
    /// Eligible user IDs.
    pub approvers: Vec<i32>,
}
