//! Authorization and catalog error types.

use thiserror::Error;

use super::permission::Action;

/// Errors raised by the authorization evaluator, the permission editor and
/// the menu/role catalog.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The menu is outside the caller's visible tree.
    #[error("Menu {0} is not accessible")]
    MenuNotVisible(String),

    /// Visible, but the role bits do not allow the action.
    #[error("Missing {action} permission on {path}")]
    MissingPermission {
        /// Menu path.
        path: String,
        /// Attempted action.
        action: Action,
    },

    /// Menu id unknown.
    #[error("Menu {0} not found")]
    MenuNotFound(i32),

    /// Role id unknown.
    #[error("Role {0} not found")]
    RoleNotFound(i32),

    /// Explicit delete of a permission row that does not exist.
    #[error("No permission row for role {role_id} on menu {menu_id}")]
    PermissionNotFound {
        /// Role ID.
        role_id: i32,
        /// Menu ID.
        menu_id: i32,
    },

    /// Parent does not exist.
    #[error("Parent menu {0} does not exist")]
    ParentNotFound(i32),

    /// Parent assignment would close a loop.
    #[error("Menu {id} cannot be placed under {parent_id}: it would create a cycle")]
    Cycle {
        /// Menu being moved.
        id: i32,
        /// Requested parent.
        parent_id: i32,
    },

    /// Duplicate name or path.
    #[error("{0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AccessError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MenuNotVisible(_) | Self::MissingPermission { .. } => 403,
            Self::MenuNotFound(_) | Self::RoleNotFound(_) | Self::PermissionNotFound { .. } => 404,
            Self::ParentNotFound(_) | Self::Cycle { .. } => 400,
            Self::Conflict(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MenuNotVisible(_) | Self::MissingPermission { .. } => "forbidden",
            Self::MenuNotFound(_) | Self::RoleNotFound(_) | Self::PermissionNotFound { .. } => {
                "not_found"
            }
            Self::ParentNotFound(_) | Self::Cycle { .. } => "validation",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_errors_are_forbidden() {
        let err = AccessError::MissingPermission {
            path: "/master/bank".into(),
            action: Action::Delete,
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "forbidden");
        assert_eq!(err.to_string(), "Missing delete permission on /master/bank");
    }

    #[test]
    fn test_catalog_errors() {
        assert_eq!(AccessError::Cycle { id: 1, parent_id: 2 }.status_code(), 400);
        assert_eq!(
            AccessError::PermissionNotFound {
                role_id: 7,
                menu_id: 3
            }
            .error_code(),
            "not_found"
        );
    }
}
