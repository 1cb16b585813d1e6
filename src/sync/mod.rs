//! sync
//!
//! Reference replication with remote peers.
//!
//! # Direction
//!
//! Synchronization is asymmetric:
//! - `pull` fetches the remote namespace, then rewrites every local
//!   binding that differs in one pass once the fetch has succeeded. Local
//!   references the remote lacks are left alone.
//! - `push` makes the remote namespace mirror the local one: forced updates
//!   for every binding that differs, deletion of remote references that no
//!   longer exist locally.
//!
//! # Outcomes
//!
//! An empty remote and a remote with nothing new are normal states, not
//! failures. Both are reported as [`SyncOutcome`] variants. A remote counts
//! as empty when it holds nothing under the replicated namespace.
//!
//! # Ordering
//!
//! A push sends its updates first and prunes only once those succeeded, so
//! a failed update never leaves the remote with fewer references than
//! before.

use std::collections::HashMap;

use thiserror::Error;

use crate::auth::{AuthError, AuthMethod, AuthResolver};
use crate::core::types::{Digest, RefName, RefSpec};
use crate::git::{Git, GitError, RefEntry};

/// Result of a successful synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// References changed.
    Synced {
        /// References created or moved
        updated: usize,
        /// References deleted
        removed: usize,
    },
    /// Nothing differed.
    UpToDate,
    /// The remote holds no references under the namespace.
    EmptyRemote,
}

impl SyncOutcome {
    /// Whether nothing was transferred.
    pub fn is_noop(&self) -> bool {
        !matches!(self, SyncOutcome::Synced { .. })
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::Synced { updated, removed } => {
                write!(f, "synced: {} updated, {} removed", updated, removed)
            }
            SyncOutcome::UpToDate => write!(f, "up to date"),
            SyncOutcome::EmptyRemote => write!(f, "remote is empty"),
        }
    }
}

/// Errors from synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No remote with this name is configured.
    #[error("remote not found: {remote}")]
    RemoteNotFound { remote: String },

    /// The remote's configuration could not be read.
    #[error("failed to read remote {remote}: {message}")]
    Remote { remote: String, message: String },

    /// No credential could be resolved for the remote.
    #[error("cannot authenticate to {remote}: {source}")]
    Auth { remote: String, source: AuthError },

    /// Fetching failed.
    #[error("pull from {remote} ({refspec}) failed: {message}")]
    Fetch {
        remote: String,
        refspec: String,
        message: String,
    },

    /// Pushing failed or was rejected.
    #[error("push to {remote} ({refspec}) failed: {message}")]
    Push {
        remote: String,
        refspec: String,
        message: String,
    },
}

/// One forced reference update on the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushUpdate {
    /// Local reference being sent
    pub local: RefName,
    /// Name it takes on the remote
    pub remote: RefName,
}

/// What a push will change on the remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushPlan {
    /// Remote references to create or move
    pub updates: Vec<PushUpdate>,
    /// Remote references to delete
    pub prunes: Vec<RefName>,
}

impl PushPlan {
    /// Whether the remote already matches.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.prunes.is_empty()
    }

    /// Refspecs for the update phase.
    pub fn update_refspecs(&self) -> Vec<String> {
        self.updates
            .iter()
            .map(|u| format!("+{}:{}", u.local, u.remote))
            .collect()
    }

    /// Refspecs for the prune phase.
    pub fn prune_refspecs(&self) -> Vec<String> {
        self.prunes.iter().map(|name| format!(":{}", name)).collect()
    }
}

/// Compare local and remote refs under `spec` and decide what to push.
///
/// Both sides are compared by stored object id. Outputs are sorted by
/// remote name.
pub fn plan_push(local: &[RefEntry], remote: &[RefEntry], spec: &RefSpec) -> PushPlan {
    let remote_oids: HashMap<&str, &Digest> = remote
        .iter()
        .filter(|entry| spec.remote.contains(&entry.name))
        .map(|entry| (entry.name.as_str(), &entry.oid))
        .collect();

    let mut mapped_locals = Vec::new();
    let mut updates = Vec::new();
    for entry in local.iter().filter(|e| spec.local.contains(&e.name)) {
        let remote_name = match spec
            .local_to_remote(entry.name.as_str())
            .and_then(|n| RefName::new(n).ok())
        {
            Some(n) => n,
            None => continue,
        };

        if remote_oids.get(remote_name.as_str()) != Some(&&entry.oid) {
            updates.push(PushUpdate {
                local: entry.name.clone(),
                remote: remote_name.clone(),
            });
        }
        mapped_locals.push(remote_name);
    }

    let mut prunes: Vec<RefName> = remote
        .iter()
        .filter(|entry| remote_oids.contains_key(entry.name.as_str()))
        .filter(|entry| spec.remote.relative(entry.name.as_str()).is_some())
        .filter(|entry| !mapped_locals.contains(&entry.name))
        .map(|entry| entry.name.clone())
        .collect();

    updates.sort_by(|a, b| a.remote.cmp(&b.remote));
    prunes.sort();
    prunes.dedup();

    PushPlan { updates, prunes }
}

/// Fetch the remote's namespace into the local one.
///
/// Credential resolution happens before anything touches the repository.
/// Local bindings change only after the whole namespace was fetched.
pub fn pull(
    git: &Git,
    remote: &str,
    refspec: &RefSpec,
    resolver: &dyn AuthResolver,
) -> Result<SyncOutcome, SyncError> {
    let auth = authenticate(git, remote, resolver)?;
    let fetch_error = |err: GitError| SyncError::Fetch {
        remote: remote.to_string(),
        refspec: refspec.to(),
        message: err.to_string(),
    };

    let fetched = git
        .remote_refs(remote, &refspec.remote, &auth)
        .map_err(fetch_error)?;
    if fetched.is_empty() {
        tracing::info!(remote, refspec = %refspec.to(), "remote is empty, nothing to pull");
        return Ok(SyncOutcome::EmptyRemote);
    }

    let local: HashMap<RefName, Digest> = git
        .list_refs(&refspec.local)
        .map_err(fetch_error)?
        .into_iter()
        .map(|entry| (entry.name, entry.oid))
        .collect();

    let changes = plan_pull(&local, &fetched, refspec);
    for (name, oid) in &changes {
        git.set_raw_ref(name, oid, "refvault: pull")
            .map_err(fetch_error)?;
    }

    let outcome = if changes.is_empty() {
        SyncOutcome::UpToDate
    } else {
        SyncOutcome::Synced {
            updated: changes.len(),
            removed: 0,
        }
    };
    tracing::info!(remote, refspec = %refspec.to(), %outcome, "pull");
    Ok(outcome)
}

/// Local names whose binding differs from the fetched remote one, with the
/// stored target each should take. Sorted by local name.
fn plan_pull(
    local: &HashMap<RefName, Digest>,
    fetched: &[RefEntry],
    spec: &RefSpec,
) -> Vec<(RefName, Digest)> {
    let mut changes: Vec<(RefName, Digest)> = fetched
        .iter()
        .filter_map(|entry| {
            let name = spec
                .remote_to_local(entry.name.as_str())
                .and_then(|n| RefName::new(n).ok())?;
            (local.get(&name) != Some(&entry.oid)).then(|| (name, entry.oid.clone()))
        })
        .collect();
    changes.sort();
    changes
}

/// Make the remote's namespace mirror the local one.
pub fn push(
    git: &Git,
    remote: &str,
    refspec: &RefSpec,
    resolver: &dyn AuthResolver,
) -> Result<SyncOutcome, SyncError> {
    let auth = authenticate(git, remote, resolver)?;
    let push_error = |err: GitError| SyncError::Push {
        remote: remote.to_string(),
        refspec: refspec.from(),
        message: err.to_string(),
    };

    let remote_refs = git
        .remote_refs(remote, &refspec.remote, &auth)
        .map_err(push_error)?;
    let local_refs = git.list_refs(&refspec.local).map_err(push_error)?;

    let plan = plan_push(&local_refs, &remote_refs, refspec);
    tracing::debug!(
        remote,
        updates = plan.updates.len(),
        prunes = plan.prunes.len(),
        "push plan"
    );
    if plan.is_empty() {
        tracing::info!(remote, refspec = %refspec.from(), "push: up to date");
        return Ok(SyncOutcome::UpToDate);
    }

    if !plan.updates.is_empty() {
        git.push(remote, &plan.update_refspecs(), &auth)
            .map_err(push_error)?;
    }
    if !plan.prunes.is_empty() {
        git.push(remote, &plan.prune_refspecs(), &auth)
            .map_err(push_error)?;
    }

    let outcome = SyncOutcome::Synced {
        updated: plan.updates.len(),
        removed: plan.prunes.len(),
    };
    tracing::info!(remote, refspec = %refspec.from(), %outcome, "push");
    Ok(outcome)
}

/// Look up the remote's URL and resolve its credential.
fn authenticate(
    git: &Git,
    remote: &str,
    resolver: &dyn AuthResolver,
) -> Result<AuthMethod, SyncError> {
    let url = git
        .find_remote(remote)
        .map_err(|err| match err {
            GitError::RemoteNotFound { .. } => SyncError::RemoteNotFound {
                remote: remote.to_string(),
            },
            err => SyncError::Remote {
                remote: remote.to_string(),
                message: err.to_string(),
            },
        })?
        .url;

    let method = resolver.resolve(&url).map_err(|source| SyncError::Auth {
        remote: remote.to_string(),
        source,
    })?;
    tracing::trace!(remote, method = method.kind(), "resolved credentials");
    Ok(method)
}
