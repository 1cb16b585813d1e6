//! store
//!
//! Content and reference storage traits.
//!
//! # Design
//!
//! Two capabilities sit on top of the git object database:
//! - [`ObjectStore`]: immutable blobs addressed by their digest
//! - [`RefStore`]: mutable name to digest bindings, filterable by namespace
//!
//! Both are implemented for [`crate::git::Git`]. Higher layers hold the
//! traits so they can be exercised against any backend.
//!
//! # Example
//!
//! ```no_run
//! use refvault::core::types::{Namespace, RefName, Reference};
//! use refvault::git::Git;
//! use refvault::store::{ObjectStore, RefStore};
//! use std::path::Path;
//!
//! fn store_one(store: &(impl ObjectStore + RefStore)) {
//!     let digest = store.write(b"token").unwrap();
//!     let name = RefName::new("refs/vault/token").unwrap();
//!     store.update(&Reference::new(name, digest)).unwrap();
//!     assert_eq!(store.list(&Namespace::root()).unwrap().len(), 1);
//! }
//!
//! store_one(&Git::open(Path::new("/srv/vault")).unwrap());
//! ```

mod objects;
mod refs;

pub use objects::{ObjectError, ObjectStore};
pub use refs::{RefError, RefStore};
