//! core::paths
//!
//! Centralized path routing for refvault storage locations.
//!
//! # Architecture
//!
//! Auxiliary files live next to the git metadata, and where that metadata
//! lives depends on the repository layout:
//! - Non-bare repositories keep it in `<root>/.git/`
//! - Bare repositories have no working directory, so it is `<root>/` itself
//!
//! **Hard rule:** No code may join auxiliary file names onto a repository
//! path by hand. All paths go through `VaultPaths`.
//!
//! # Storage Layout
//!
//! - `refvault.lock` - Exclusive lock file (holder metadata as JSON)
//! - `refvault/config.toml` - Repository configuration
//!
//! # Example
//!
//! ```
//! use refvault::core::paths::VaultPaths;
//! use std::path::PathBuf;
//!
//! let paths = VaultPaths::new(PathBuf::from("/srv/vault"), false);
//! assert_eq!(paths.lock_path(), PathBuf::from("/srv/vault/.git/refvault.lock"));
//!
//! let bare = VaultPaths::new(PathBuf::from("/srv/hub.git"), true);
//! assert_eq!(bare.lock_path(), PathBuf::from("/srv/hub.git/refvault.lock"));
//! ```

use std::path::{Path, PathBuf};

/// File name of the repository lock.
pub const LOCK_FILE_NAME: &str = "refvault.lock";

/// Path routing for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultPaths {
    /// The repository root as given by the caller.
    pub root: PathBuf,
    /// Whether the repository is bare (no working directory).
    pub bare: bool,
}

impl VaultPaths {
    /// Create path routing for the repository at `root`.
    pub fn new(root: PathBuf, bare: bool) -> Self {
        Self { root, bare }
    }

    /// The directory holding git metadata.
    ///
    /// This is `<root>` for bare repositories and `<root>/.git` otherwise.
    pub fn metadata_dir(&self) -> PathBuf {
        if self.bare {
            self.root.clone()
        } else {
            self.root.join(".git")
        }
    }

    /// Get the path to the repository lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.metadata_dir().join(LOCK_FILE_NAME)
    }

    /// Get the directory for refvault's own repository data.
    pub fn vault_dir(&self) -> PathBuf {
        self.metadata_dir().join("refvault")
    }

    /// Get the path to the repository configuration file.
    pub fn repo_config_path(&self) -> PathBuf {
        self.vault_dir().join("config.toml")
    }

    /// Get the directory holding git objects.
    pub fn objects_dir(&self) -> PathBuf {
        self.metadata_dir().join("objects")
    }

    /// Get the root as a Path reference.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
