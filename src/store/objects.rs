//! store::objects
//!
//! Content-addressed blob storage.

use thiserror::Error;

use crate::core::types::Digest;
use crate::git::{Git, GitError};

/// Errors from object storage operations.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// The blob could not be written.
    #[error("failed to store {len} byte object: {source}")]
    Store {
        /// Size of the rejected content
        len: usize,
        source: GitError,
    },

    /// No object with this digest is stored locally.
    #[error("object not found: {digest}")]
    NotFound {
        /// The digest that was looked up
        digest: Digest,
    },

    /// The object exists but could not be read.
    #[error("failed to read object {digest}: {source}")]
    Read {
        /// The digest that was looked up
        digest: Digest,
        source: GitError,
    },
}

/// Immutable blobs addressed by the digest of their contents.
///
/// Writing the same bytes twice yields the same digest and stores one copy.
/// There is no delete.
pub trait ObjectStore {
    /// Store `content` and return its digest.
    fn write(&self, content: &[u8]) -> Result<Digest, ObjectError>;

    /// Read back the content stored under `digest`.
    fn cat(&self, digest: &Digest) -> Result<Vec<u8>, ObjectError>;
}

impl ObjectStore for Git {
    fn write(&self, content: &[u8]) -> Result<Digest, ObjectError> {
        let digest = self.write_blob(content).map_err(|source| ObjectError::Store {
            len: content.len(),
            source,
        })?;
        tracing::debug!(digest = %digest, len = content.len(), "write");
        Ok(digest)
    }

    fn cat(&self, digest: &Digest) -> Result<Vec<u8>, ObjectError> {
        tracing::trace!(digest = %digest, "cat");
        self.read_blob(digest).map_err(|source| match source {
            GitError::ObjectNotFound { .. } => ObjectError::NotFound {
                digest: digest.clone(),
            },
            source => ObjectError::Read {
                digest: digest.clone(),
                source,
            },
        })
    }
}
