//! Request bodies of the user, role, menu and permission endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create/update body of a menu.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MenuInput {
    /// Display label.
    #[validate(length(min = 1, max = 255, message = "label is required"))]
    pub label: String,
    /// Route path, unique; also the authorization key.
    #[validate(length(min = 1, max = 255, message = "path is required"))]
    pub path: String,
    /// Parent menu, 0 for top level.
    #[serde(default)]
    pub parent_id: i32,
    /// Sibling order.
    #[serde(default)]
    pub sort: i32,
    /// Icon name.
    #[serde(default)]
    pub icon: Option<String>,
}

/// Create/update body of a role; `menu_ids` replaces the visible set.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleInput {
    /// Unique role name.
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Menus the role can see.
    #[serde(default)]
    pub menu_ids: Vec<i32>,
}

/// Create/update body of a user.
///
/// `password` is required on create and optional on update, where an
/// absent value keeps the current hash.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserInput {
    /// Unique login name.
    #[validate(length(min = 1, max = 100, message = "username is required"))]
    pub username: String,
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,
    /// Email used for password resets.
    #[validate(email(message = "email is invalid"))]
    #[serde(default)]
    pub email: Option<String>,
    /// Plain password, hashed before storage.
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    #[serde(default)]
    pub password: Option<String>,
    /// Department.
    #[serde(default)]
    pub department_id: Option<i32>,
    /// Linked employee.
    #[serde(default)]
    pub employee_id: Option<i32>,
    /// Whether the account may log in.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Roles held; replaces the current set.
    #[serde(default)]
    pub role_ids: Vec<i32>,
}

const fn default_true() -> bool {
    true
}

/// Body of a permission upsert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PermissionInput {
    /// Role ID.
    pub role_id: i32,
    /// Menu ID.
    pub menu_id: i32,
    /// Create bit.
    #[serde(default)]
    pub is_create: bool,
    /// Update bit.
    #[serde(default)]
    pub is_update: bool,
    /// Delete bit.
    #[serde(default)]
    pub is_delete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_input_defaults() {
        let input: UserInput =
            serde_json::from_str(r#"{"username": "ana", "name": "Ana"}"#).unwrap();
        assert!(input.is_active);
        assert!(input.role_ids.is_empty());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_user_input_rejects_short_password_and_bad_email() {
        let input: UserInput = serde_json::from_str(
            r#"{"username": "ana", "name": "Ana", "email": "nope", "password": "short"}"#,
        )
        .unwrap();
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_menu_input_requires_path() {
        let input: MenuInput = serde_json::from_str(r#"{"label": "Bank", "path": ""}"#).unwrap();
        assert!(input.validate().is_err());
        assert_eq!(input.parent_id, 0);
    }
}
