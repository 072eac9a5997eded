//! Multi-level approval chains.
//!
//! # Modules
//!
//! - `types` - Chain levels, decisions and notification steps
//! - `engine` - Chain walking, validation and renumbering
//! - `error` - Approval error types

pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod approval_props;

pub use engine::ApprovalEngine;
pub use error::ApprovalError;
pub use types::{
    ACTIVE, Approval, CREATE_ACTION, ChainLevel, Decision, LevelDraft, NextStep, Outcome, PENDING,
};
