//! core::lock
//!
//! Exclusive repository lock.
//!
//! # Architecture
//!
//! The repo lock ensures only one cooperating process mutates references or
//! synchronizes a repository at a time. The lock is advisory: it protects
//! only callers that take it.
//!
//! The lock file lives beside the git metadata (see
//! [`VaultPaths::lock_path`]): `<root>/refvault.lock` for bare repositories,
//! `<root>/.git/refvault.lock` otherwise.
//!
//! # Invariants
//!
//! - Acquisition is non-blocking (fails fast if locked)
//! - The lock is not reentrant; a second acquire on the same path fails
//! - Release removes the lock file first, then drops the OS-level lock
//! - The OS-level lock is authoritative. A lock file left behind by a dead
//!   process is re-acquired, since the kernel released its OS lock
//!
//! # Example
//!
//! ```ignore
//! use refvault::core::lock::RepoLock;
//! use refvault::core::paths::VaultPaths;
//! use std::path::PathBuf;
//!
//! let paths = VaultPaths::new(PathBuf::from("/srv/vault"), false);
//! let mut lock = RepoLock::acquire(&paths)?;
//!
//! // Perform operations while holding lock
//! // ...
//!
//! lock.release()?;
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::paths::VaultPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder already has the lock.
    #[error("repository lock {} is held{}", .path.display(), describe_holder(.holder))]
    Held {
        /// Lock file path
        path: PathBuf,
        /// Holder metadata, if it could be read
        holder: Option<LockHolder>,
    },

    /// Unlock was requested without holding the lock, including a second
    /// unlock after a successful one.
    ///
    /// Together with [`LockError::Unlock`] this makes up the unlock failures;
    /// see [`LockError::is_unlock_error`].
    #[error("repository lock {} is not held by this handle", .path.display())]
    NotHeld {
        /// Lock file path
        path: PathBuf,
    },

    /// Failed to create or open the lock file.
    #[error("failed to create lock {}: {source}", .path.display())]
    Create {
        /// Lock file path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Failed to acquire the OS lock for a reason other than contention.
    #[error("failed to acquire lock {}: {source}", .path.display())]
    Acquire {
        /// Lock file path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Failed to release the lock (lock file missing or OS release failure).
    #[error("failed to release lock {}: {source}", .path.display())]
    Unlock {
        /// Lock file path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

impl LockError {
    /// Whether this error came from releasing the lock rather than taking it.
    pub fn is_unlock_error(&self) -> bool {
        matches!(self, LockError::NotHeld { .. } | LockError::Unlock { .. })
    }
}

fn describe_holder(holder: &Option<LockHolder>) -> String {
    match holder {
        Some(h) => format!(" by {h}"),
        None => String::new(),
    }
}

/// Metadata the holder writes into the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    /// Process id of the holder
    pub pid: u32,
    /// When the lock was acquired
    pub acquired_at: DateTime<Utc>,
}

impl LockHolder {
    /// Metadata describing the current process.
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at: Utc::now(),
        }
    }

    /// Read holder metadata from a lock file, if present and parseable.
    pub fn read(path: &Path) -> Option<Self> {
        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

impl std::fmt::Display for LockHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pid {} since {}", self.pid, self.acquired_at.to_rfc3339())
    }
}

/// An exclusive lock on the repository.
///
/// Release it explicitly with [`RepoLock::release`] to observe failures.
/// Dropping a held lock releases it best-effort, so the lock is never kept
/// past a panic.
#[derive(Debug)]
pub struct RepoLock {
    /// Path to the lock file.
    path: PathBuf,
    /// The open file handle with the lock held.
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl RepoLock {
    /// Attempt to acquire the lock for a repository.
    ///
    /// # Errors
    ///
    /// - [`LockError::Held`] if another holder has the lock
    /// - [`LockError::Create`] if the lock file cannot be opened
    /// - [`LockError::Acquire`] if the OS lock fails for another reason
    pub fn acquire(paths: &VaultPaths) -> Result<Self, LockError> {
        Self::acquire_at(&paths.lock_path())
    }

    /// Attempt to acquire a lock file at an explicit path.
    pub fn acquire_at(path: &Path) -> Result<Self, LockError> {
        let path = path.to_path_buf();
        tracing::trace!(path = %path.display(), "obtaining exclusive lock");

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Create {
                path: path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => {
                let holder = LockHolder::read(&path);
                return Err(LockError::Held { path, holder });
            }
            Err(source) => return Err(LockError::Acquire { path, source }),
        }

        // A releasing holder unlinks the file before dropping its OS lock, so
        // the handle we locked may no longer be the file at `path`.
        if !same_file(&file, &path) {
            let _ = FileExt::unlock(&file);
            let holder = LockHolder::read(&path);
            return Err(LockError::Held { path, holder });
        }

        if let Some(previous) = read_previous_holder(&mut file) {
            tracing::warn!(
                path = %path.display(),
                previous = %previous,
                "reclaiming lock file left by a holder that is gone"
            );
        }

        if let Err(source) = write_holder(&mut file, &LockHolder::current()) {
            let _ = FileExt::unlock(&file);
            return Err(LockError::Acquire { path, source });
        }

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock.
    ///
    /// Removes the lock file, then releases the OS lock. Both steps are
    /// attempted even if the first fails.
    ///
    /// # Errors
    ///
    /// - [`LockError::NotHeld`] if the lock was already released
    /// - [`LockError::Unlock`] if the lock file is missing or the OS
    ///   release fails
    pub fn release(&mut self) -> Result<(), LockError> {
        let file = self.file.take().ok_or_else(|| LockError::NotHeld {
            path: self.path.clone(),
        })?;

        let removed = fs::remove_file(&self.path);
        let unlocked = FileExt::unlock(&file);
        drop(file);

        removed.map_err(|source| LockError::Unlock {
            path: self.path.clone(),
            source,
        })?;
        unlocked.map_err(|source| LockError::Unlock {
            path: self.path.clone(),
            source,
        })?;

        tracing::trace!(path = %self.path.display(), "released exclusive lock");
        Ok(())
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        // Best-effort release on drop - ignore errors since we're dropping
        if let Some(file) = self.file.take() {
            let _ = fs::remove_file(&self.path);
            let _ = FileExt::unlock(&file);
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn read_previous_holder(file: &mut File) -> Option<LockHolder> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_holder(file: &mut File, holder: &LockHolder) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    serde_json::to_writer(&mut *file, holder)?;
    file.flush()?;
    file.sync_data()
}

#[cfg(unix)]
fn same_file(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(_file: &File, path: &Path) -> bool {
    path.exists()
}
