//! Menu visibility and permission evaluation.
//!
//! # Modules
//!
//! - `tree` - Builds the visible menu forest from a flat menu list
//! - `permission` - Permission bits, the gate, and upsert planning
//! - `error` - Access error types

pub mod error;
pub mod permission;
pub mod tree;

pub use error::AccessError;
pub use permission::{Action, PermissionBits, UpsertPlan, check_gate, effective, plan_upsert};
pub use tree::{
    MenuForest, MenuNode, MenuRecord, ROOT, annotate, build_forest, flatten_ids, would_cycle,
};
