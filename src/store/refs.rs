//! store::refs
//!
//! Named pointers into the object store.
//!
//! # Semantics
//!
//! - `update` is an upsert: the last write for a name wins
//! - `delete` goes by name only
//! - `list` filters on segment boundaries, so `refs/ab/1` is never
//!   inside `refs/a`
//!
//! A reference may name a digest that is not stored locally (for example
//! after a fetch that pruned content). Reading it through the object store
//! reports `NotFound`.

use std::collections::HashSet;

use thiserror::Error;

use crate::core::types::{Digest, Namespace, RefName, Reference};
use crate::git::{Git, GitError};

/// Errors from reference storage operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The binding could not be written.
    #[error("failed to update {name} -> {target}: {source}")]
    Update {
        name: RefName,
        target: Digest,
        source: GitError,
    },

    /// No reference with this name exists.
    #[error("reference not found: {name}")]
    NotFound { name: RefName },

    /// The reference exists but could not be removed.
    #[error("failed to delete {name}: {source}")]
    Delete { name: RefName, source: GitError },

    /// Enumerating the namespace failed.
    #[error("failed to list {namespace}: {source}")]
    List {
        namespace: Namespace,
        source: GitError,
    },
}

/// CRUD over name to digest bindings.
pub trait RefStore {
    /// Bind `reference.name` to `reference.target`, replacing any binding.
    ///
    /// The target object must exist locally.
    fn update(&self, reference: &Reference) -> Result<(), RefError>;

    /// Remove the binding for `name`.
    fn delete(&self, name: &RefName) -> Result<(), RefError>;

    /// All references inside `namespace`.
    fn list(&self, namespace: &Namespace) -> Result<HashSet<Reference>, RefError>;
}

impl RefStore for Git {
    fn update(&self, reference: &Reference) -> Result<(), RefError> {
        tracing::debug!(reference = %reference.name, target = %reference.target, "update");
        self.set_ref(&reference.name, &reference.target)
            .map_err(|source| RefError::Update {
                name: reference.name.clone(),
                target: reference.target.clone(),
                source,
            })
    }

    fn delete(&self, name: &RefName) -> Result<(), RefError> {
        tracing::debug!(reference = %name, "delete");
        self.delete_ref(name).map_err(|source| match source {
            GitError::RefNotFound { .. } => RefError::NotFound { name: name.clone() },
            source => RefError::Delete {
                name: name.clone(),
                source,
            },
        })
    }

    fn list(&self, namespace: &Namespace) -> Result<HashSet<Reference>, RefError> {
        let refs: HashSet<Reference> = self
            .list_references(namespace)
            .map_err(|source| RefError::List {
                namespace: namespace.clone(),
                source,
            })?
            .into_iter()
            .collect();
        tracing::trace!(namespace = %namespace, count = refs.len(), "list");
        Ok(refs)
    }
}
