//! Common types used across the application.

pub mod admin;
pub mod pagination;

pub use admin::{MenuInput, PermissionInput, RoleInput, UserInput};
pub use pagination::{ListQuery, ListResponse, SortDir};
