//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! refvault. All git interactions flow through this interface, which
//! returns strong types and normalizes libgit2 errors into typed failure
//! categories.
//!
//! # Architecture
//!
//! The `Git` struct is the only way to interact with a repository.
//! No other module imports `git2` directly.
//!
//! # Reference Envelopes
//!
//! libgit2's transports walk commits. A ref pointing straight at a blob (or
//! at a tag wrapping one) makes the local transport refuse to build a pack
//! once such a ref exists on the fetching side. Every reference written
//! here therefore points at a root commit whose tree holds the content blob
//! under a single entry. The commit is deterministic: fixed author and
//! committer, epoch timestamp, message equal to the reference name. Two
//! peers writing the same binding produce the same commit.
//!
//! # Remote Listing
//!
//! Remote references are learned from fetches, never from the raw
//! advertisement. [`Git::remote_refs`] fetches a namespace into a scratch
//! area, records every tip the fetch matched, and clears the area before
//! and after.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: No repository at the path
//! - [`GitError::AlreadyExists`]: Refusing to re-initialize
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::ObjectNotFound`]: Requested object does not exist
//! - [`GitError::NotABlob`]: A digest names something other than content
//! - [`GitError::Transport`] / [`GitError::Auth`]: Remote communication failed
//! - [`GitError::PushRejected`]: The remote refused one or more updates
//!
//! # Example
//!
//! ```no_run
//! use refvault::core::types::{RefName, Namespace};
//! use refvault::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/srv/vault")).unwrap();
//! let digest = git.write_blob(b"payload").unwrap();
//! git.set_ref(&RefName::new("refs/vault/a").unwrap(), &digest).unwrap();
//! for reference in git.list_references(&Namespace::new("refs/vault").unwrap()).unwrap() {
//!     println!("{}", reference);
//! }
//! ```

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::auth::AuthMethod;
use crate::core::paths::VaultPaths;
use crate::core::types::{Digest, Namespace, RefName, RefSpec, Reference, Remote, TypeError};

/// Author name stamped on reference envelopes.
const ENVELOPE_NAME: &str = "refvault";

/// Author email stamped on reference envelopes.
const ENVELOPE_EMAIL: &str = "refvault@localhost";

/// Tree entry holding the content blob inside an envelope.
const ENVELOPE_ENTRY: &str = "content";

/// Where [`Git::remote_refs`] fetches remote namespaces to inspect them.
const STAGING_PREFIX: &str = "refs/refvault-staging";

/// How many times the credential callback answers before giving up.
///
/// libgit2 calls the callback again after every rejection; without a bound
/// a wrong key loops forever.
pub const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Errors from Git operations.
///
/// These error types cover all categories of Git failures that refvault
/// needs to handle distinctly.
#[derive(Debug, Error)]
pub enum GitError {
    /// No repository exists at the path.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// A repository already exists at the path.
    #[error("repository already exists: {path}")]
    AlreadyExists {
        /// The path that was initialized
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// The digest names an object that is not a blob.
    #[error("not a content blob: {oid}")]
    NotABlob {
        /// The offending OID
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// No remote with this name is configured.
    #[error("remote not found: {name}")]
    RemoteNotFound {
        /// The remote name
        name: String,
    },

    /// A remote with this name is already configured.
    #[error("remote already exists: {name}")]
    RemoteExists {
        /// The remote name
        name: String,
    },

    /// Network or transport failure talking to a remote.
    #[error("transport error for {context}: {message}")]
    Transport {
        /// Remote name or URL
        context: String,
        /// libgit2's description
        message: String,
    },

    /// The remote rejected our credentials.
    #[error("authentication failed for {context}: {message}")]
    Auth {
        /// Remote name or URL
        context: String,
        /// libgit2's description
        message: String,
    },

    /// The remote refused one or more reference updates.
    #[error("push to {remote} rejected: {details}")]
    PushRejected {
        /// The remote name
        remote: String,
        /// `<ref>: <reason>` entries joined with "; "
        details: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidRefName {
                message: format!("{}: {}", context, err.message()),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Classify an error raised while talking to a remote.
    fn from_transport(err: git2::Error, context: &str) -> Self {
        let auth_failure = matches!(
            err.code(),
            git2::ErrorCode::Auth | git2::ErrorCode::Certificate
        );
        if auth_failure {
            return GitError::Auth {
                context: context.to_string(),
                message: err.message().to_string(),
            };
        }

        GitError::Transport {
            context: context.to_string(),
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidDigest(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) | TypeError::InvalidNamespace(msg) => {
                GitError::InvalidRefName { message: msg }
            }
        }
    }
}

/// A ref entry as stored, before envelope peeling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    /// Full ref name
    pub name: RefName,
    /// The object the ref points at (an envelope commit for refvault refs)
    pub oid: Digest,
}


/// The Git interface.
///
/// This is the **single point of interaction** with git. All repository
/// reads and writes flow through this interface.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
    /// Where the repository lives (work dir, or git dir when bare)
    root: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("root", &self.root)
            .field("bare", &self.repo.is_bare())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Lifecycle
    // =========================================================================

    fn from_repo(repo: git2::Repository) -> Self {
        let root = match repo.workdir() {
            Some(workdir) if !repo.is_bare() => workdir.to_path_buf(),
            _ => repo.path().to_path_buf(),
        };
        Self { repo, root }
    }

    /// Create a new repository at `path`, creating directories as needed.
    ///
    /// # Errors
    ///
    /// - [`GitError::AlreadyExists`] if a repository is already there
    /// - [`GitError::AccessError`] if the path cannot be used
    pub fn init(path: &Path, bare: bool) -> Result<Self, GitError> {
        let mut opts = git2::RepositoryInitOptions::new();
        opts.bare(bare).no_reinit(true).mkdir(true).mkpath(true);

        let repo = git2::Repository::init_opts(path, &opts).map_err(|e| match e.code() {
            git2::ErrorCode::Exists => GitError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => GitError::AccessError {
                message: format!("{}: {}", path.display(), e.message()),
            },
        })?;

        Ok(Self::from_repo(repo))
    }

    /// Open the repository exactly at `path`.
    ///
    /// `path` may be a working directory or the git directory of a bare
    /// repository. Parent directories are not searched.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is at `path`
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => GitError::NotARepo {
                path: path.to_path_buf(),
            },
            _ => GitError::from_git2(e, &path.display().to_string()),
        })?;

        Ok(Self::from_repo(repo))
    }

    /// Clone `url` into `path` without checking out a working tree.
    ///
    /// The origin remote is created under `remote_name`.
    pub fn clone_from(
        url: &str,
        path: &Path,
        remote_name: &str,
        auth: &AuthMethod,
    ) -> Result<Self, GitError> {
        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(remote_callbacks(auth));

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.dry_run();

        let remote_name = remote_name.to_string();
        let repo = git2::build::RepoBuilder::new()
            .fetch_options(fetch)
            .with_checkout(checkout)
            .remote_create(move |repo, _name, url| repo.remote(&remote_name, url))
            .clone(url, path)
            .map_err(|e| match e.code() {
                git2::ErrorCode::Exists => GitError::AlreadyExists {
                    path: path.to_path_buf(),
                },
                _ => GitError::from_transport(e, url),
            })?;

        Ok(Self::from_repo(repo))
    }

    /// The repository root: the work dir, or the git dir when bare.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the repository has no working directory.
    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }

    /// Path routing for this repository's auxiliary files.
    pub fn paths(&self) -> VaultPaths {
        VaultPaths::new(self.root.clone(), self.is_bare())
    }

    // =========================================================================
    // Blob Operations
    // =========================================================================

    /// Write content as a blob and return its digest.
    ///
    /// Writing identical content again returns the same digest and
    /// stores nothing new.
    pub fn write_blob(&self, content: &[u8]) -> Result<Digest, GitError> {
        let oid = self.repo.blob(content).map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        Ok(digest_of(oid)?)
    }

    /// Read a blob by digest.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the blob doesn't exist
    pub fn read_blob(&self, digest: &Digest) -> Result<Vec<u8>, GitError> {
        let oid = git_oid(digest)?;
        let blob = self
            .repo
            .find_blob(oid)
            .map_err(|e| GitError::from_git2(e, digest.as_str()))?;

        Ok(blob.content().to_vec())
    }

    // =========================================================================
    // Ref Mutation
    // =========================================================================

    /// Point `name` at `target`, wrapped in a reference envelope.
    ///
    /// Overwrites any existing binding.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if `target` is not stored locally
    /// - [`GitError::NotABlob`] if `target` is not content
    pub fn set_ref(&self, name: &RefName, target: &Digest) -> Result<(), GitError> {
        let envelope = self.envelope(name, target)?;
        self.repo
            .reference(name.as_str(), envelope, true, "refvault: update")
            .map_err(|e| GitError::from_git2(e, name.as_str()))?;
        Ok(())
    }

    /// Delete the ref `name`.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn delete_ref(&self, name: &RefName) -> Result<(), GitError> {
        let mut reference = self
            .repo
            .find_reference(name.as_str())
            .map_err(|e| GitError::from_git2(e, name.as_str()))?;

        reference
            .delete()
            .map_err(|e| GitError::from_git2(e, name.as_str()))
    }

    /// Point `name` at an already stored object, with no envelope.
    ///
    /// Used to apply fetched envelopes under their local names.
    pub fn set_raw_ref(&self, name: &RefName, stored: &Digest, log: &str) -> Result<(), GitError> {
        self.repo
            .reference(name.as_str(), git_oid(stored)?, true, log)
            .map_err(|e| GitError::from_git2(e, name.as_str()))?;
        Ok(())
    }

    /// Write the deterministic envelope commit for a binding.
    fn envelope(&self, name: &RefName, target: &Digest) -> Result<git2::Oid, GitError> {
        let oid = git_oid(target)?;
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;
        if object.kind() != Some(git2::ObjectType::Blob) {
            return Err(GitError::NotABlob {
                oid: target.to_string(),
            });
        }

        let internal = |e: git2::Error| GitError::Internal {
            message: format!("envelope for {}: {}", name, e.message()),
        };

        let mut builder = self.repo.treebuilder(None).map_err(internal)?;
        builder
            .insert(ENVELOPE_ENTRY, oid, i32::from(git2::FileMode::Blob))
            .map_err(internal)?;
        let tree_oid = builder.write().map_err(internal)?;
        let tree = self.repo.find_tree(tree_oid).map_err(internal)?;

        let author = git2::Signature::new(ENVELOPE_NAME, ENVELOPE_EMAIL, &git2::Time::new(0, 0))
            .map_err(internal)?;

        // The odb hashes the commit before writing, so an identical binding
        // resolves to the object that is already stored.
        self.repo
            .commit(None, &author, &author, &format!("{}\n", name), &tree, &[])
            .map_err(internal)
    }

    // =========================================================================
    // Ref Enumeration
    // =========================================================================

    /// List refs inside `namespace` with their stored (unpeeled) targets.
    ///
    /// Symbolic refs and refs with invalid names are skipped.
    pub fn list_refs(&self, namespace: &Namespace) -> Result<Vec<RefEntry>, GitError> {
        let refs = self.repo.references().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        let mut entries = Vec::new();
        for reference in refs {
            let reference = reference.map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

            let name = match reference.name() {
                Some(n) if namespace.contains_str(n) => n,
                _ => continue,
            };

            let ref_name = match RefName::new(name) {
                Ok(r) => r,
                Err(_) => continue,
            };

            // Symbolic refs have no direct target
            let oid = match reference.target() {
                Some(oid) => oid,
                None => continue,
            };

            entries.push(RefEntry {
                name: ref_name,
                oid: digest_of(oid)?,
            });
        }

        Ok(entries)
    }

    /// List references inside `namespace`, peeled to their content digests.
    pub fn list_references(&self, namespace: &Namespace) -> Result<Vec<Reference>, GitError> {
        self.list_refs(namespace)?
            .into_iter()
            .map(|entry| -> Result<Reference, GitError> {
                let target = self.peel(&entry.oid)?;
                Ok(Reference::new(entry.name, target))
            })
            .collect()
    }

    /// Resolve a stored ref target to the content digest it binds.
    ///
    /// Envelope commits yield their content entry. Anything else (including
    /// objects missing from the local store) is returned unchanged.
    pub fn peel(&self, stored: &Digest) -> Result<Digest, GitError> {
        let oid = git_oid(stored)?;
        let content = self.repo.find_commit(oid).ok().and_then(|commit| {
            let tree = commit.tree().ok()?;
            let entry = tree.get_name(ENVELOPE_ENTRY)?;
            Some(entry.id())
        });

        match content {
            Some(content) => Ok(digest_of(content)?),
            None => Ok(stored.clone()),
        }
    }

    // =========================================================================
    // Remotes
    // =========================================================================

    /// Register a remote whose fetch and push refspecs follow `spec`.
    pub fn add_remote(&self, name: &str, url: &str, spec: &RefSpec) -> Result<(), GitError> {
        self.repo
            .remote_with_fetch(name, url, &spec.to())
            .map_err(|e| match e.code() {
                git2::ErrorCode::Exists => GitError::RemoteExists {
                    name: name.to_string(),
                },
                _ => GitError::from_git2(e, name),
            })?;

        self.repo
            .remote_add_push(name, &spec.from())
            .map_err(|e| GitError::from_git2(e, name))
    }

    /// Load the remote `name` from the repository config.
    pub fn find_remote(&self, name: &str) -> Result<Remote, GitError> {
        let remote = self.git_remote(name)?;

        let url = remote
            .url()
            .ok_or_else(|| GitError::Internal {
                message: format!("remote {} has a non-UTF-8 url", name),
            })?
            .to_string();

        let refspecs = remote.fetch_refspecs().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        let refspec = refspecs
            .iter()
            .flatten()
            .find_map(|spec| RefSpec::parse(spec, true).ok());

        Ok(Remote {
            name: name.to_string(),
            url,
            refspec,
        })
    }

    /// Names of all configured remotes.
    pub fn remote_names(&self) -> Result<Vec<String>, GitError> {
        let names = self.repo.remotes().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        Ok(names.iter().flatten().map(str::to_string).collect())
    }

    fn git_remote(&self, name: &str) -> Result<git2::Remote<'_>, GitError> {
        self.repo.find_remote(name).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => GitError::RemoteNotFound {
                name: name.to_string(),
            },
            _ => GitError::from_git2(e, name),
        })
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Fetch `refspecs` from the URL of the remote `name`.
    ///
    /// Returns every remote reference the refspecs matched, under its local
    /// name, whether or not it moved. Tags are never followed automatically
    /// and `FETCH_HEAD` is not written.
    ///
    /// The fetch goes through an anonymous remote. A named one would also
    /// move every local ref its configured refspecs map to.
    fn fetch(
        &self,
        name: &str,
        refspecs: &[String],
        auth: &AuthMethod,
    ) -> Result<Vec<RefEntry>, GitError> {
        let url = self.find_remote(name)?.url;
        let mut remote = self
            .repo
            .remote_anonymous(&url)
            .map_err(|e| GitError::from_git2(e, name))?;
        let reported = RefCell::new(Vec::new());

        {
            let mut callbacks = remote_callbacks(auth);
            callbacks.update_tips(|refname, _old, new| {
                reported.borrow_mut().push((refname.to_string(), new));
                true
            });

            let mut options = git2::FetchOptions::new();
            options
                .remote_callbacks(callbacks)
                .download_tags(git2::AutotagOption::None)
                .update_fetchhead(false)
                .report_unchanged(true);

            remote
                .fetch(refspecs, Some(&mut options), Some("refvault: fetch"))
                .map_err(|e| GitError::from_transport(e, name))?;
        }

        let mut tips = Vec::new();
        for (refname, new) in reported.into_inner() {
            let Ok(ref_name) = RefName::new(refname) else {
                continue;
            };
            tips.push(RefEntry {
                name: ref_name,
                oid: digest_of(new)?,
            });
        }
        tips.sort_by(|a, b| a.name.cmp(&b.name));
        tips.dedup_by(|a, b| a.name == b.name);

        tracing::trace!(remote = name, tips = tips.len(), "fetched");
        Ok(tips)
    }

    /// The references under `namespace` on the remote `name`, with their
    /// stored targets.
    ///
    /// The namespace is fetched into `refs/refvault-staging/<remote>/`,
    /// which is emptied before the fetch and again after it, whether or not
    /// the fetch succeeded. Local references outside the scratch area are
    /// not touched.
    pub fn remote_refs(
        &self,
        name: &str,
        namespace: &Namespace,
        auth: &AuthMethod,
    ) -> Result<Vec<RefEntry>, GitError> {
        let staging = Namespace::new(format!("{}/{}", STAGING_PREFIX, name))?;
        self.clear_namespace(&staging)?;

        let refspec = format!("+{}:{}", namespace.glob(), staging.glob());
        let fetched = self.fetch(name, &[refspec], auth);
        let cleared = self.clear_namespace(&staging);
        let tips = fetched?;
        cleared?;

        let mut entries = Vec::new();
        for tip in tips {
            let Some(rest) = staging.relative(tip.name.as_str()) else {
                continue;
            };
            entries.push(RefEntry {
                name: RefName::new(namespace.join(rest))?,
                oid: tip.oid,
            });
        }
        Ok(entries)
    }

    fn clear_namespace(&self, namespace: &Namespace) -> Result<(), GitError> {
        for entry in self.list_refs(namespace)? {
            self.delete_ref(&entry.name)?;
        }
        Ok(())
    }

    /// Push `refspecs` to the remote `name`.
    ///
    /// # Errors
    ///
    /// - [`GitError::PushRejected`] if the remote refused any reference
    pub fn push(&self, name: &str, refspecs: &[String], auth: &AuthMethod) -> Result<(), GitError> {
        let mut remote = self.git_remote(name)?;
        let rejected = RefCell::new(Vec::new());

        {
            let mut callbacks = remote_callbacks(auth);
            callbacks.push_update_reference(|refname, status| {
                if let Some(reason) = status {
                    rejected.borrow_mut().push(format!("{}: {}", refname, reason));
                }
                Ok(())
            });

            let mut options = git2::PushOptions::new();
            options.remote_callbacks(callbacks);

            remote
                .push(refspecs, Some(&mut options))
                .map_err(|e| GitError::from_transport(e, name))?;
        }

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(GitError::PushRejected {
                remote: name.to_string(),
                details: rejected.join("; "),
            });
        }

        Ok(())
    }
}

/// Counts credential requests for one connection.
#[derive(Debug, Default)]
struct CredentialBudget {
    attempts: u32,
}

impl CredentialBudget {
    fn spend(&mut self, url: &str) -> Result<(), git2::Error> {
        self.attempts += 1;
        if self.attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::new(
                git2::ErrorCode::Auth,
                git2::ErrorClass::Callback,
                format!(
                    "credentials for {} rejected after {} attempts",
                    url, MAX_CREDENTIAL_ATTEMPTS
                ),
            ));
        }
        Ok(())
    }
}

/// Build transport callbacks that answer credential requests from `auth`.
fn remote_callbacks(auth: &AuthMethod) -> git2::RemoteCallbacks<'_> {
    let mut budget = CredentialBudget::default();
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed| {
        budget.spend(url)?;
        credential(auth, url, username_from_url, allowed)
    });
    callbacks
}

fn credential(
    auth: &AuthMethod,
    url: &str,
    username_from_url: Option<&str>,
    allowed: git2::CredentialType,
) -> Result<git2::Cred, git2::Error> {
    match auth {
        AuthMethod::Anonymous => git2::Cred::default(),
        AuthMethod::SshAgent { username } => {
            if allowed.contains(git2::CredentialType::USERNAME) {
                return git2::Cred::username(username);
            }
            git2::Cred::ssh_key_from_agent(username)
        }
        AuthMethod::SshKey {
            username,
            private_key,
            public_key,
            passphrase,
        } => {
            if allowed.contains(git2::CredentialType::USERNAME) {
                return git2::Cred::username(username);
            }
            git2::Cred::ssh_key(
                username,
                public_key.as_deref(),
                private_key,
                passphrase.as_deref(),
            )
        }
        AuthMethod::UserPass { username, password } => {
            git2::Cred::userpass_plaintext(username, password)
        }
        AuthMethod::CredentialHelper { username } => {
            let config = git2::Config::open_default()?;
            git2::Cred::credential_helper(&config, url, username.as_deref().or(username_from_url))
        }
    }
}

fn git_oid(digest: &Digest) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(digest.as_str()).map_err(|_| GitError::InvalidOid {
        oid: digest.to_string(),
    })
}

fn digest_of(oid: git2::Oid) -> Result<Digest, TypeError> {
    Digest::new(oid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn name(s: &str) -> RefName {
        RefName::new(s).unwrap()
    }

    fn ns(s: &str) -> Namespace {
        Namespace::new(s).unwrap()
    }

    mod git_error {
        use super::*;

        #[test]
        fn display_formatting() {
            let err = GitError::PushRejected {
                remote: "hub".to_string(),
                details: "refs/vault/a: stale info".to_string(),
            };
            assert!(err.to_string().contains("hub"));
            assert!(err.to_string().contains("stale info"));
        }

        #[test]
        fn type_errors_convert() {
            let err: GitError = TypeError::InvalidDigest("xyz".to_string()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
            let err: GitError = TypeError::InvalidNamespace("x".to_string()).into();
            assert!(matches!(err, GitError::InvalidRefName { .. }));
        }

        #[test]
        fn auth_codes_classified() {
            let err = git2::Error::new(
                git2::ErrorCode::Auth,
                git2::ErrorClass::Ssh,
                "denied",
            );
            assert!(matches!(
                GitError::from_transport(err, "hub"),
                GitError::Auth { .. }
            ));

            let err = git2::Error::new(
                git2::ErrorCode::GenericError,
                git2::ErrorClass::Net,
                "unreachable",
            );
            assert!(matches!(
                GitError::from_transport(err, "hub"),
                GitError::Transport { .. }
            ));
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn init_refuses_existing_repo() {
            let dir = TempDir::new().unwrap();
            Git::init(dir.path(), false).unwrap();
            assert!(matches!(
                Git::init(dir.path(), false),
                Err(GitError::AlreadyExists { .. })
            ));
        }

        #[test]
        fn init_creates_missing_directories() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("a/b/vault");
            let git = Git::init(&path, false).unwrap();
            assert!(!git.is_bare());
            assert!(path.join(".git").is_dir());
        }

        #[test]
        fn bare_root_is_git_dir() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), true).unwrap();
            assert!(git.is_bare());
            assert_eq!(
                git.paths().lock_path(),
                git.root().join("refvault.lock")
            );
        }

        #[test]
        fn open_does_not_search_parents() {
            let dir = TempDir::new().unwrap();
            Git::init(dir.path(), false).unwrap();
            let nested = dir.path().join("nested");
            std::fs::create_dir(&nested).unwrap();
            assert!(matches!(
                Git::open(&nested),
                Err(GitError::NotARepo { .. })
            ));
        }
    }

    mod refs {
        use super::*;

        #[test]
        fn set_ref_requires_local_object() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), false).unwrap();
            let missing = Digest::new("1111111111111111111111111111111111111111").unwrap();
            assert!(git.set_ref(&name("refs/vault/a"), &missing).is_err());
        }

        #[test]
        fn set_ref_rejects_non_blobs() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), false).unwrap();
            let digest = git.write_blob(b"secret").unwrap();
            git.set_ref(&name("refs/vault/a"), &digest).unwrap();

            let envelope = git.list_refs(&ns("refs/vault")).unwrap().remove(0).oid;
            assert!(matches!(
                git.set_ref(&name("refs/vault/b"), &envelope),
                Err(GitError::NotABlob { .. })
            ));
        }

        #[test]
        fn envelopes_are_commits() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), true).unwrap();
            let digest = git.write_blob(b"secret").unwrap();
            git.set_ref(&name("refs/vault/a"), &digest).unwrap();

            let stored = git.list_refs(&ns("refs/vault")).unwrap().remove(0).oid;
            let commit = git.repo.find_commit(git_oid(&stored).unwrap()).unwrap();
            assert_eq!(commit.parent_count(), 0);
            assert_eq!(commit.author().when().seconds(), 0);
            assert_eq!(commit.message(), Some("refs/vault/a\n"));
        }

        #[test]
        fn raw_refs_are_not_wrapped() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), false).unwrap();
            let digest = git.write_blob(b"secret").unwrap();
            git.set_ref(&name("refs/vault/a"), &digest).unwrap();
            let envelope = git.list_refs(&ns("refs/vault")).unwrap().remove(0).oid;

            git.set_raw_ref(&name("refs/vault/copy"), &envelope, "test")
                .unwrap();
            let peeled = git.list_references(&ns("refs/vault/copy")).unwrap();
            assert_eq!(peeled, vec![Reference::new(name("refs/vault/copy"), digest)]);
        }

        #[test]
        fn refs_are_stored_in_envelopes() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), false).unwrap();
            let digest = git.write_blob(b"secret").unwrap();
            git.set_ref(&name("refs/vault/a"), &digest).unwrap();

            let raw = git.list_refs(&ns("refs/vault")).unwrap();
            assert_eq!(raw.len(), 1);
            assert_ne!(raw[0].oid, digest);
            assert_eq!(git.peel(&raw[0].oid).unwrap(), digest);

            let peeled = git.list_references(&ns("refs/vault")).unwrap();
            assert_eq!(peeled, vec![Reference::new(name("refs/vault/a"), digest)]);
        }

        #[test]
        fn envelopes_are_deterministic() {
            let dir_a = TempDir::new().unwrap();
            let dir_b = TempDir::new().unwrap();
            let a = Git::init(dir_a.path(), false).unwrap();
            let b = Git::init(dir_b.path(), true).unwrap();

            for git in [&a, &b] {
                let digest = git.write_blob(b"same").unwrap();
                git.set_ref(&name("refs/vault/x"), &digest).unwrap();
            }

            let raw_a = a.list_refs(&ns("refs/vault")).unwrap();
            let raw_b = b.list_refs(&ns("refs/vault")).unwrap();
            assert_eq!(raw_a, raw_b);
        }

        #[test]
        fn delete_missing_ref() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), false).unwrap();
            assert!(matches!(
                git.delete_ref(&name("refs/vault/none")),
                Err(GitError::RefNotFound { .. })
            ));
        }
    }

    mod credentials {
        use super::*;

        #[test]
        fn budget_runs_out() {
            let mut budget = CredentialBudget::default();
            for _ in 0..MAX_CREDENTIAL_ATTEMPTS {
                budget.spend("ssh://example.com/vault").unwrap();
            }
            let err = budget.spend("ssh://example.com/vault").unwrap_err();
            assert_eq!(err.code(), git2::ErrorCode::Auth);
            assert!(matches!(
                GitError::from_transport(err, "hub"),
                GitError::Auth { .. }
            ));
        }

        #[test]
        fn ssh_methods_answer_username_request_first() {
            let agent = AuthMethod::SshAgent {
                username: "git".to_string(),
            };
            let cred = credential(
                &agent,
                "ssh://example.com/vault",
                None,
                git2::CredentialType::USERNAME,
            )
            .unwrap();
            assert_eq!(cred.credtype(), git2::CredentialType::USERNAME.bits());
        }

        #[test]
        fn user_pass_is_plaintext() {
            let method = AuthMethod::UserPass {
                username: "robot".to_string(),
                password: "hunter2".to_string(),
            };
            let cred = credential(
                &method,
                "https://example.com/vault",
                None,
                git2::CredentialType::USER_PASS_PLAINTEXT,
            )
            .unwrap();
            assert_eq!(
                cred.credtype(),
                git2::CredentialType::USER_PASS_PLAINTEXT.bits()
            );
        }
    }

    mod remotes {
        use super::*;

        #[test]
        fn add_and_find_remote() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), false).unwrap();
            let spec = RefSpec::mirror(ns("refs/vault"));
            git.add_remote("hub", "/srv/hub.git", &spec).unwrap();

            let remote = git.find_remote("hub").unwrap();
            assert_eq!(remote.url, "/srv/hub.git");
            assert_eq!(remote.refspec, Some(spec.clone()));
            assert_eq!(git.remote_names().unwrap(), vec!["hub".to_string()]);

            assert!(matches!(
                git.add_remote("hub", "/elsewhere", &spec),
                Err(GitError::RemoteExists { .. })
            ));
        }

        #[test]
        fn unknown_remote() {
            let dir = TempDir::new().unwrap();
            let git = Git::init(dir.path(), false).unwrap();
            assert!(matches!(
                git.find_remote("nope"),
                Err(GitError::RemoteNotFound { .. })
            ));
        }
    }
}
