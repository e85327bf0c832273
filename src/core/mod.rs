//! Core types and functionality for manifest-sync
//!
//! This module forms the foundation of the synchronizer's type system. It
//! currently hosts the error taxonomy; shared domain types live next to the
//! components that own them ([`crate::vdf`], [`crate::manifest`],
//! [`crate::hosting`]).
//!
//! # Error Management
//!
//! - **Strongly-typed errors** ([`SyncError`]) for precise handling in code
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions
//!   for CLI users
//! - **Automatic conversion** from common standard library and dependency
//!   errors
//!
//! Every fallible operation returns a [`Result`] with meaningful error
//! information; per-item failures inside a pass are logged and contained,
//! while setup failures propagate to the CLI boundary where
//! [`user_friendly_error`] renders them.

pub mod error;

pub use error::{ErrorContext, SyncError, user_friendly_error};
