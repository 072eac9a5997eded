//! Approval runtime error types.

use thiserror::Error;

/// Errors that can occur while editing or walking approval chains.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The record already reached its chain's last level.
    #[error("Approval chain is already closed for this record")]
    AlreadyClosed,

    /// Acting at a level other than the next open one.
    #[error("Out of order: level {expected} is next, not {requested}")]
    OutOfOrder {
        /// Next open level.
        expected: i32,
        /// Level the caller tried to act on.
        requested: i32,
    },

    /// The user is not an approver anywhere in the chain.
    #[error("User {0} is not an approver for this chain")]
    NotApprover(i32),

    /// No definitions exist for the menu and action.
    #[error("No approval chain for '{action}' on {menu}")]
    NoChain {
        /// Menu path.
        menu: String,
        /// Chain action.
        action: String,
    },

    /// A submitted chain breaks the level rules.
    #[error("Invalid approval chain: {0}")]
    InvalidChain(String),

    /// Definition id unknown.
    #[error("Approval definition {0} not found")]
    DefinitionNotFound(i32),

    /// Table name is not under approval control.
    #[error("Table '{0}' does not support approvals")]
    UnknownTable(String),

    /// Target record missing.
    #[error("Record {id} not found in {table}")]
    RecordNotFound {
        /// Table name.
        table: String,
        /// Record ID.
        id: i32,
    },

    /// Menu path unknown.
    #[error("Menu {0} not found")]
    MenuNotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::AlreadyClosed | Self::OutOfOrder { .. } => 409,
            Self::NotApprover(_) => 403,
            Self::InvalidChain(_) | Self::UnknownTable(_) => 400,
            Self::NoChain { .. }
            | Self::DefinitionNotFound(_)
            | Self::RecordNotFound { .. }
            | Self::MenuNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyClosed => "already_closed",
            Self::OutOfOrder { .. } => "out_of_order",
            Self::NotApprover(_) => "forbidden",
            Self::InvalidChain(_) | Self::UnknownTable(_) => "validation",
            Self::NoChain { .. }
            | Self::DefinitionNotFound(_)
            | Self::RecordNotFound { .. }
            | Self::MenuNotFound(_) => "not_found",
            Self::Database(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_violations_are_conflicts() {
        assert_eq!(ApprovalError::AlreadyClosed.status_code(), 409);
        assert_eq!(ApprovalError::AlreadyClosed.error_code(), "already_closed");

        let err = ApprovalError::OutOfOrder {
            expected: 1,
            requested: 2,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "out_of_order");
        assert!(err.to_string().contains("level 1"));
    }

    #[test]
    fn test_not_approver_is_forbidden() {
        let err = ApprovalError::NotApprover(9);
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "forbidden");
    }
}
