//! refvault - content-addressed blobs and named references on git
//!
//! refvault stores opaque content as git blobs addressed by their digest,
//! binds names under `refs/` to those digests, and replicates a namespace
//! of names between peers over any transport git speaks.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to [`repo`])
//! - [`repo`] - The repository handle: lifecycle, store, sync and locking
//! - [`store`] - Object and reference store traits over git
//! - [`sync`] - Pull and push of a namespace with a remote peer
//! - [`auth`] - Credential resolution for remote URLs
//! - [`core`] - Domain types, configuration, path routing and the lock
//! - [`git`] - Single interface for all Git operations
//! - [`observe`] - Per-handle event routing
//! - [`ui`] - User interaction utilities
//!
//! # Guarantees
//!
//! 1. Storing identical content twice yields the same digest
//! 2. A reference is stored identically in every repository that holds it
//! 3. Listing a namespace never returns names outside it
//! 4. After a successful push the remote namespace mirrors the local one

pub mod auth;
pub mod cli;
pub mod core;
pub mod git;
pub mod observe;
pub mod repo;
pub mod store;
pub mod sync;
pub mod ui;
