//! repo
//!
//! The repository handle.
//!
//! # Overview
//!
//! [`Repository`] binds one storage location and exposes everything a
//! caller does with it:
//! - lifecycle: [`initialize`](Repository::initialize),
//!   [`initialize_bare`](Repository::initialize_bare),
//!   [`clone`](Repository::clone), [`open`](Repository::open), each with a
//!   `_with` form that takes an [`Observer`]
//! - content: [`write`](Repository::write), [`cat`](Repository::cat)
//! - references: [`update`](Repository::update),
//!   [`delete`](Repository::delete), [`list`](Repository::list)
//! - replication: [`pull`](Repository::pull), [`push`](Repository::push)
//! - exclusion: [`lock`](Repository::lock), [`unlock`](Repository::unlock),
//!   [`with_lock`](Repository::with_lock)
//!
//! # Locking
//!
//! The lock is advisory. Callers take it around mutating critical sections;
//! nothing here takes it implicitly. It is not reentrant: locking a handle
//! that already holds the lock reports [`LockError::Held`].
//!
//! # Observability
//!
//! Every operation emits its events into the handle's [`Observer`].
//!
//! # Example
//!
//! ```no_run
//! use refvault::auth::{AuthMethod, StaticResolver};
//! use refvault::core::types::{Namespace, RefName, Reference};
//! use refvault::repo::{RepoError, Repository};
//! use std::path::Path;
//!
//! let ns = Namespace::new("refs/vault").unwrap();
//! let mut repo = Repository::initialize(Path::new("/tmp/vault"), "hub", "/srv/hub.git", &ns)?;
//!
//! repo.with_lock(|repo| -> anyhow::Result<()> {
//!     let digest = repo.write(b"s3cr3t")?;
//!     repo.update(&Reference::new(RefName::new("refs/vault/db")?, digest))?;
//!     repo.push("hub", &refvault::core::types::RefSpec::mirror(ns.clone()), &StaticResolver::new(AuthMethod::Anonymous))?;
//!     Ok(())
//! }).unwrap();
//! # Ok::<(), RepoError>(())
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::auth::{AuthError, AuthResolver};
use crate::core::config::{Config, ConfigError};
use crate::core::lock::{LockError, LockHolder, RepoLock};
use crate::core::paths::VaultPaths;
use crate::core::types::{Digest, Namespace, RefName, RefSpec, Reference, Remote};
use crate::git::{Git, GitError};
use crate::observe::Observer;
use crate::store::{ObjectError, ObjectStore, RefError, RefStore};
use crate::sync::{self, SyncError, SyncOutcome};

/// Errors from repository lifecycle and configuration.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Creating the repository failed.
    #[error("failed to initialize repository at {path}: {source}")]
    Init { path: PathBuf, source: GitError },

    /// Cloning failed.
    #[error("failed to clone {url} into {path}: {source}")]
    Clone {
        url: String,
        path: PathBuf,
        source: GitError,
    },

    /// No usable repository at the path.
    #[error("failed to open repository at {path}: {source}")]
    Open { path: PathBuf, source: GitError },

    /// No credential could be resolved for the URL.
    #[error("cannot authenticate to {url}: {source}")]
    Auth { url: String, source: AuthError },

    /// No remote with this name is configured.
    #[error("remote not found: {name}")]
    RemoteNotFound { name: String },

    /// Reading the remote configuration failed.
    #[error("failed to read remote {name}: {source}")]
    Remote { name: String, source: GitError },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A handle onto one repository.
///
/// Owns the binding to the storage location, not the bytes. Dropping the
/// handle releases a lock it still holds.
pub struct Repository {
    git: Git,
    paths: VaultPaths,
    lock: Option<RepoLock>,
    observer: Observer,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.paths.root)
            .field("bare", &self.paths.bare)
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl Repository {
    fn from_git(git: Git, observer: Observer) -> Self {
        let paths = git.paths();
        Self {
            git,
            paths,
            lock: None,
            observer,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a repository at `path` with one remote scoped to `namespace`.
    ///
    /// The remote fetches `namespace` into itself and pushes it back.
    ///
    /// # Errors
    ///
    /// [`RepoError::Init`] if the path is unusable, already holds a
    /// repository, or the remote cannot be registered.
    pub fn initialize(
        path: &Path,
        remote_name: &str,
        url: &str,
        namespace: &Namespace,
    ) -> Result<Self, RepoError> {
        Self::initialize_with(path, remote_name, url, namespace, Observer::current())
    }

    /// [`initialize`](Repository::initialize), reporting to `observer` from
    /// the first event on.
    pub fn initialize_with(
        path: &Path,
        remote_name: &str,
        url: &str,
        namespace: &Namespace,
        observer: Observer,
    ) -> Result<Self, RepoError> {
        let events = observer.enter();
        tracing::info!(path = %path.display(), remote = remote_name, url, "init");

        let init_error = |source| RepoError::Init {
            path: path.to_path_buf(),
            source,
        };
        let git = Git::init(path, false).map_err(init_error)?;
        git.add_remote(remote_name, url, &RefSpec::mirror(namespace.clone()))
            .map_err(init_error)?;

        drop(events);
        Ok(Self::from_git(git, observer))
    }

    /// Create an empty bare repository at `path`, with no remotes.
    ///
    /// Bare repositories serve as hubs that peers push to and pull from.
    pub fn initialize_bare(path: &Path) -> Result<Self, RepoError> {
        Self::initialize_bare_with(path, Observer::current())
    }

    /// [`initialize_bare`](Repository::initialize_bare) with an observer.
    pub fn initialize_bare_with(path: &Path, observer: Observer) -> Result<Self, RepoError> {
        let events = observer.enter();
        tracing::info!(path = %path.display(), "init bare");

        let git = Git::init(path, true).map_err(|source| RepoError::Init {
            path: path.to_path_buf(),
            source,
        })?;

        drop(events);
        Ok(Self::from_git(git, observer))
    }

    /// Clone `url` into `path`, naming the remote `remote_name`.
    ///
    /// No working tree is checked out.
    pub fn clone(
        url: &str,
        remote_name: &str,
        path: &Path,
        resolver: &dyn AuthResolver,
    ) -> Result<Self, RepoError> {
        Self::clone_with(url, remote_name, path, resolver, Observer::current())
    }

    /// [`clone`](Repository::clone) with an observer.
    pub fn clone_with(
        url: &str,
        remote_name: &str,
        path: &Path,
        resolver: &dyn AuthResolver,
        observer: Observer,
    ) -> Result<Self, RepoError> {
        let events = observer.enter();
        let auth = resolver.resolve(url).map_err(|source| RepoError::Auth {
            url: url.to_string(),
            source,
        })?;

        tracing::info!(url, path = %path.display(), remote = remote_name, "clone");

        let git = Git::clone_from(url, path, remote_name, &auth).map_err(|source| {
            RepoError::Clone {
                url: url.to_string(),
                path: path.to_path_buf(),
                source,
            }
        })?;

        drop(events);
        Ok(Self::from_git(git, observer))
    }

    /// Open the repository exactly at `path` (bare or not).
    pub fn open(path: &Path) -> Result<Self, RepoError> {
        Self::open_with(path, Observer::current())
    }

    /// [`open`](Repository::open) with an observer.
    pub fn open_with(path: &Path, observer: Observer) -> Result<Self, RepoError> {
        let events = observer.enter();
        let git = Git::open(path).map_err(|source| RepoError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::trace!(path = %path.display(), bare = git.is_bare(), "open");

        drop(events);
        Ok(Self::from_git(git, observer))
    }

    /// Report events to `observer` instead of the dispatcher that was
    /// current when the handle was created.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    /// The repository root: the work dir, or the git dir when bare.
    pub fn path(&self) -> &Path {
        self.paths.root()
    }

    /// Whether the repository has no working directory.
    pub fn is_bare(&self) -> bool {
        self.paths.bare
    }

    /// Path routing for this repository's auxiliary files.
    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    /// Load configuration with this repository's overrides applied.
    pub fn config(&self) -> Result<Config, RepoError> {
        Ok(Config::load(Some(&self.paths))?)
    }

    /// Look up a configured remote.
    pub fn remote(&self, name: &str) -> Result<Remote, RepoError> {
        self.git.find_remote(name).map_err(|source| match source {
            GitError::RemoteNotFound { .. } => RepoError::RemoteNotFound {
                name: name.to_string(),
            },
            source => RepoError::Remote {
                name: name.to_string(),
                source,
            },
        })
    }

    /// All configured remotes.
    pub fn remotes(&self) -> Result<Vec<Remote>, RepoError> {
        let names = self.git.remote_names().map_err(|source| RepoError::Remote {
            name: "*".to_string(),
            source,
        })?;
        names.iter().map(|name| self.remote(name)).collect()
    }

    // =========================================================================
    // Objects and References
    // =========================================================================

    /// Store `content` and return its digest.
    pub fn write(&self, content: &[u8]) -> Result<Digest, ObjectError> {
        let _events = self.observer.enter();
        ObjectStore::write(&self.git, content)
    }

    /// Read the content stored under `digest`.
    pub fn cat(&self, digest: &Digest) -> Result<Vec<u8>, ObjectError> {
        let _events = self.observer.enter();
        self.git.cat(digest)
    }

    /// Bind a name to a digest, replacing any earlier binding.
    pub fn update(&self, reference: &Reference) -> Result<(), RefError> {
        let _events = self.observer.enter();
        self.git.update(reference)
    }

    /// Remove the binding named by `reference`. Only the name is used.
    pub fn delete(&self, reference: &Reference) -> Result<(), RefError> {
        self.delete_name(&reference.name)
    }

    /// Remove the binding for `name`.
    pub fn delete_name(&self, name: &RefName) -> Result<(), RefError> {
        let _events = self.observer.enter();
        self.git.delete(name)
    }

    /// All references inside `namespace`.
    pub fn list(&self, namespace: &Namespace) -> Result<HashSet<Reference>, RefError> {
        let _events = self.observer.enter();
        self.git.list(namespace)
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// Fetch `refspec` from the remote `remote_name`.
    pub fn pull(
        &self,
        remote_name: &str,
        refspec: &RefSpec,
        resolver: &dyn AuthResolver,
    ) -> Result<SyncOutcome, SyncError> {
        let _events = self.observer.enter();
        tracing::debug!(remote = remote_name, refspec = %refspec.to(), "pull");
        sync::pull(&self.git, remote_name, refspec, resolver)
    }

    /// Push `refspec` to the remote `remote_name`, pruning stale refs.
    pub fn push(
        &self,
        remote_name: &str,
        refspec: &RefSpec,
        resolver: &dyn AuthResolver,
    ) -> Result<SyncOutcome, SyncError> {
        let _events = self.observer.enter();
        tracing::debug!(remote = remote_name, refspec = %refspec.from(), "push");
        sync::push(&self.git, remote_name, refspec, resolver)
    }

    // =========================================================================
    // Locking
    // =========================================================================

    /// Take the exclusive repository lock without blocking.
    ///
    /// # Errors
    ///
    /// - [`LockError::Held`] if another holder (or this handle) has it
    /// - [`LockError::Create`] / [`LockError::Acquire`] on I/O failure
    pub fn lock(&mut self) -> Result<(), LockError> {
        let _events = self.observer.enter();
        let path = self.paths.lock_path();

        if self.lock.is_some() {
            return Err(LockError::Held {
                holder: LockHolder::read(&path),
                path,
            });
        }

        tracing::trace!(path = %path.display(), "obtaining exclusive lock");
        self.lock = Some(RepoLock::acquire(&self.paths)?);
        Ok(())
    }

    /// Release the repository lock and remove its file.
    ///
    /// # Errors
    ///
    /// - [`LockError::NotHeld`] if this handle does not hold the lock, as
    ///   after a second unlock
    /// - [`LockError::Unlock`] if the file is already gone or the OS
    ///   release fails
    pub fn unlock(&mut self) -> Result<(), LockError> {
        let _events = self.observer.enter();
        match self.lock.take() {
            Some(mut lock) => {
                tracing::trace!(path = %lock.path().display(), "releasing exclusive lock");
                lock.release()
            }
            None => Err(LockError::NotHeld {
                path: self.paths.lock_path(),
            }),
        }
    }

    /// Whether this handle holds the lock.
    pub fn is_locked(&self) -> bool {
        self.lock.as_ref().is_some_and(RepoLock::is_held)
    }

    /// Run `f` with the lock held, releasing it on every exit path.
    ///
    /// An error from `f` wins over a release error.
    pub fn with_lock<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<LockError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        self.lock()?;
        let result = f(self);
        let released = if self.lock.is_some() {
            self.unlock()
        } else {
            Ok(())
        };

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err.into()),
            (Err(err), _) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ns() -> Namespace {
        Namespace::new("refs/vault").unwrap()
    }

    #[test]
    fn initialize_registers_remote() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::initialize(dir.path(), "hub", "/srv/hub.git", &ns()).unwrap();

        let remote = repo.remote("hub").unwrap();
        assert_eq!(remote.url, "/srv/hub.git");
        assert_eq!(remote.refspec, Some(RefSpec::mirror(ns())));
        assert!(!repo.is_bare());
    }

    #[test]
    fn initialize_twice_fails() {
        let dir = TempDir::new().unwrap();
        Repository::initialize(dir.path(), "hub", "/srv/hub.git", &ns()).unwrap();
        assert!(matches!(
            Repository::initialize(dir.path(), "hub", "/srv/hub.git", &ns()),
            Err(RepoError::Init { .. })
        ));
    }

    #[test]
    fn open_missing_repository() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Repository::open(dir.path()),
            Err(RepoError::Open { .. })
        ));
    }

    #[test]
    fn unknown_remote() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::initialize_bare(dir.path()).unwrap();
        assert!(matches!(
            repo.remote("origin"),
            Err(RepoError::RemoteNotFound { .. })
        ));
        assert!(repo.remotes().unwrap().is_empty());
    }

    #[test]
    fn lock_is_not_reentrant() {
        let dir = TempDir::new().unwrap();
        let mut repo = Repository::initialize_bare(dir.path()).unwrap();
        repo.lock().unwrap();
        assert!(matches!(repo.lock(), Err(LockError::Held { .. })));
        repo.unlock().unwrap();
        let err = repo.unlock().unwrap_err();
        assert!(matches!(err, LockError::NotHeld { .. }));
        assert!(err.is_unlock_error());
    }

    #[test]
    fn with_lock_releases_on_error() {
        let dir = TempDir::new().unwrap();
        let mut repo = Repository::initialize_bare(dir.path()).unwrap();

        let result: Result<(), anyhow::Error> = repo.with_lock(|repo| {
            assert!(repo.is_locked());
            anyhow::bail!("boom")
        });

        assert!(result.is_err());
        assert!(!repo.is_locked());
        assert!(!repo.paths().lock_path().exists());
    }

    #[test]
    fn with_lock_returns_value() {
        let dir = TempDir::new().unwrap();
        let mut repo = Repository::initialize_bare(dir.path()).unwrap();

        let digest = repo
            .with_lock(|repo| -> Result<Digest, anyhow::Error> { Ok(repo.write(b"x")?) })
            .unwrap();
        assert_eq!(repo.cat(&digest).unwrap(), b"x");
    }

    #[test]
    fn delete_uses_name_only() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::initialize_bare(dir.path()).unwrap();
        let name = RefName::new("refs/vault/k").unwrap();
        let target = repo.write(b"v1").unwrap();
        repo.update(&Reference::new(name.clone(), target)).unwrap();

        let stale = Reference::new(name, repo.write(b"v2").unwrap());
        repo.delete(&stale).unwrap();
        assert!(repo.list(&ns()).unwrap().is_empty());
    }
}
