//! Shared types, errors, and configuration for Foundry.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - JWT claims, token service and auth payloads
//! - SMTP mailer and ERP client
//! - Query envelope for list endpoints

pub mod auth;
pub mod config;
pub mod email;
pub mod erp;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
