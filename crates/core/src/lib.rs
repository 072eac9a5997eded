//! Core business logic for Foundry.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `auth` - Password hashing, TOTP, and authentication rules
//! - `access` - Menu visibility, permission bits and the authorization gate
//! - `approval` - Multi-level approval chains
//! - `sync` - Employee roster reconciliation

pub mod access;
pub mod approval;
pub mod auth;
pub mod sync;
