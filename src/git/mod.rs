//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to git. All repository reads and
//! writes flow through this interface. No other module imports `git2`, and
//! nothing outside this module parses files under `.git` by hand.
//!
//! # Responsibilities
//!
//! - Repository creation, cloning and opening
//! - Blob operations (write, read)
//! - Ref operations (envelope-wrapped set, delete, namespace listing)
//! - Remote configuration
//! - Transport (staged remote listing, push) with credential callbacks
//!
//! # Invariants
//!
//! - Every ref written here points at a deterministic envelope commit
//! - No other module calls git2 directly
//! - All operations return strong types (Digest, RefName, Reference)

mod interface;

pub use interface::{Git, GitError, RefEntry, MAX_CREDENTIAL_ATTEMPTS};
