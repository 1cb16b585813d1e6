//! core
//!
//! Core domain types, configuration and repository-local state.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Digest, RefName, Namespace, RefSpec
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for refvault storage
//! - [`lock`] - Exclusive repository lock
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod lock;
pub mod paths;
pub mod types;
