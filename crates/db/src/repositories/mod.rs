//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod access;
pub mod activity_log;
pub mod approval;
pub mod employee;
mod listing;
pub mod master;
pub mod menu;
pub mod password_reset;
pub mod permission;
pub mod role;
pub mod user;

pub use access::AccessRepository;
pub use activity_log::{ActivityLogRepository, NewActivity};
pub use approval::{
    ActInput, ActResult, ApprovalNotification, ApprovalRepository, ApproverInfo, ChainView,
    HistoryEntry, StructureLevel, initial_status,
};
pub use employee::{EmployeeRepository, SyncReport};
pub use master::{MasterError, MasterRepository};
pub use menu::MenuRepository;
pub use password_reset::{IssuedReset, PasswordResetRepository};
pub use permission::PermissionRepository;
pub use role::{RoleRepository, RoleWithMenus};
pub use user::{UserRepository, UserWithRoles};
