//! Integration tests for pull and push between peers through a local bare hub.

mod common;

use std::collections::{BTreeSet, HashSet};
use std::io::Write;

use common::{anonymous, capturing, names, ns, put, spec, Cluster, HUB};
use refvault::auth::{AuthError, AuthMethod};
use refvault::core::types::{Namespace, RefSpec};
use refvault::repo::{RepoError, Repository};
use refvault::sync::{SyncError, SyncOutcome};

fn refused(url: &str) -> Result<AuthMethod, AuthError> {
    Err(AuthError::MissingCredential {
        url: url.to_string(),
        message: "no credentials in tests".to_string(),
    })
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Pull
// =============================================================================

#[test]
fn pull_from_empty_remote_is_tolerated() {
    let cluster = Cluster::new();
    let peer = cluster.peer("a");

    let outcome = peer.pull(HUB, &spec(), &anonymous()).unwrap();

    assert_eq!(outcome, SyncOutcome::EmptyRemote);
    assert!(outcome.is_noop());
    assert!(names(&peer).is_empty());
}

#[test]
fn push_then_pull_replicates_references() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    let b = cluster.peer("b");
    let db = put(&a, "refs/vault/db", b"postgres://");
    put(&a, "refs/vault/api/key", b"k-123");

    assert_eq!(
        a.push(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::Synced {
            updated: 2,
            removed: 0
        }
    );
    assert_eq!(
        b.pull(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::Synced {
            updated: 2,
            removed: 0
        }
    );

    assert_eq!(b.list(&ns()).unwrap(), a.list(&ns()).unwrap());
    assert_eq!(b.cat(&db.target).unwrap(), b"postgres://");
}

#[test]
fn second_pull_is_up_to_date() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    let b = cluster.peer("b");
    put(&a, "refs/vault/x", b"x");
    a.push(HUB, &spec(), &anonymous()).unwrap();

    assert!(!b.pull(HUB, &spec(), &anonymous()).unwrap().is_noop());
    assert_eq!(
        b.pull(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::UpToDate
    );
}

#[test]
fn pull_counts_only_moved_references() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    let b = cluster.peer("b");
    put(&a, "refs/vault/x", b"x1");
    put(&a, "refs/vault/y", b"y");
    a.push(HUB, &spec(), &anonymous()).unwrap();
    b.pull(HUB, &spec(), &anonymous()).unwrap();

    let moved = put(&a, "refs/vault/x", b"x2");
    a.push(HUB, &spec(), &anonymous()).unwrap();

    assert_eq!(
        b.pull(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::Synced {
            updated: 1,
            removed: 0
        }
    );
    assert!(b.list(&ns()).unwrap().contains(&moved));
}

#[test]
fn repointed_reference_pulls_again() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    let b = cluster.peer("b");
    put(&a, "refs/vault/x", b"x1");
    a.push(HUB, &spec(), &anonymous()).unwrap();
    b.pull(HUB, &spec(), &anonymous()).unwrap();

    let second = put(&a, "refs/vault/x", b"x2");
    assert_eq!(
        a.push(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::Synced {
            updated: 1,
            removed: 0
        }
    );
    assert_eq!(a.list(&ns()).unwrap(), HashSet::from([second.clone()]));
    assert_eq!(
        b.pull(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::Synced {
            updated: 1,
            removed: 0
        }
    );
    assert_eq!(b.cat(&second.target).unwrap(), b"x2");

    let third = put(&a, "refs/vault/x", b"x3");
    a.push(HUB, &spec(), &anonymous()).unwrap();
    b.pull(HUB, &spec(), &anonymous()).unwrap();
    assert_eq!(b.list(&ns()).unwrap(), HashSet::from([third]));
}

#[test]
fn pull_from_remote_without_namespace_is_empty() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    let b = cluster.peer("b");
    put(&a, "refs/other/x", b"x");
    a.push(
        HUB,
        &RefSpec::mirror(Namespace::new("refs/other").unwrap()),
        &anonymous(),
    )
    .unwrap();

    assert_eq!(
        b.pull(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::EmptyRemote
    );
    assert!(names(&b).is_empty());
}

#[test]
fn sync_leaves_no_scratch_references() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    let b = cluster.peer("b");
    put(&a, "refs/vault/x", b"x");
    a.push(HUB, &spec(), &anonymous()).unwrap();
    b.pull(HUB, &spec(), &anonymous()).unwrap();

    for peer in [&a, &b] {
        let everything: BTreeSet<String> = peer
            .list(&Namespace::root())
            .unwrap()
            .into_iter()
            .map(|r| r.name.to_string())
            .collect();
        assert_eq!(everything, set(&["refs/vault/x"]));
    }
}

#[test]
fn pull_keeps_references_deleted_remotely() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    let b = cluster.peer("b");
    let gone = put(&a, "refs/vault/gone", b"g");
    put(&a, "refs/vault/kept", b"k");
    a.push(HUB, &spec(), &anonymous()).unwrap();
    b.pull(HUB, &spec(), &anonymous()).unwrap();

    a.delete(&gone).unwrap();
    a.push(HUB, &spec(), &anonymous()).unwrap();

    assert_eq!(
        b.pull(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::UpToDate
    );
    assert_eq!(names(&b), set(&["refs/vault/gone", "refs/vault/kept"]));
}

#[test]
fn pull_translates_namespaces() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    put(&a, "refs/vault/team/db", b"db");
    a.push(HUB, &spec(), &anonymous()).unwrap();

    let mirror = Namespace::new("refs/mirror").unwrap();
    let c = Repository::initialize(&cluster.path("c"), HUB, &cluster.hub_url(), &mirror).unwrap();
    c.pull(HUB, &RefSpec::new(mirror.clone(), ns()), &anonymous())
        .unwrap();

    let listed: Vec<String> = c
        .list(&mirror)
        .unwrap()
        .into_iter()
        .map(|r| r.name.to_string())
        .collect();
    assert_eq!(listed, vec!["refs/mirror/team/db".to_string()]);
    assert!(names(&c).is_empty());
}

// =============================================================================
// Push
// =============================================================================

#[test]
fn second_push_is_up_to_date() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    put(&a, "refs/vault/x", b"x");

    a.push(HUB, &spec(), &anonymous()).unwrap();
    assert_eq!(
        a.push(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::UpToDate
    );
}

#[test]
fn push_prunes_locally_deleted_references() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    put(&a, "refs/vault/kept", b"k");
    let gone = put(&a, "refs/vault/gone", b"g");
    a.push(HUB, &spec(), &anonymous()).unwrap();

    a.delete(&gone).unwrap();
    assert_eq!(
        a.push(HUB, &spec(), &anonymous()).unwrap(),
        SyncOutcome::Synced {
            updated: 0,
            removed: 1
        }
    );

    assert_eq!(names(&cluster.hub()), set(&["refs/vault/kept"]));
}

#[test]
fn push_leaves_other_namespaces_alone() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    put(&a, "refs/vault/x", b"x");
    put(&a, "refs/other/y", b"y");

    a.push(HUB, &spec(), &anonymous()).unwrap();

    let hub = cluster.hub();
    assert_eq!(names(&hub), set(&["refs/vault/x"]));
    assert!(hub
        .list(&Namespace::new("refs/other").unwrap())
        .unwrap()
        .is_empty());
}

#[test]
fn push_translates_namespaces() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    put(&a, "refs/vault/x", b"x");

    let backup = Namespace::new("refs/backup").unwrap();
    a.push(HUB, &RefSpec::new(ns(), backup.clone()), &anonymous())
        .unwrap();

    let hub = cluster.hub();
    assert_eq!(hub.list(&backup).unwrap().len(), 1);
    assert!(names(&hub).is_empty());
}

#[test]
fn pull_then_push_merges_peers() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    let b = cluster.peer("b");
    put(&a, "refs/vault/from-a", b"a");
    a.push(HUB, &spec(), &anonymous()).unwrap();

    put(&b, "refs/vault/from-b", b"b");
    b.pull(HUB, &spec(), &anonymous()).unwrap();
    b.push(HUB, &spec(), &anonymous()).unwrap();

    assert_eq!(
        names(&cluster.hub()),
        set(&["refs/vault/from-a", "refs/vault/from-b"])
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn unknown_remote() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");

    assert!(matches!(
        a.pull("nowhere", &spec(), &anonymous()),
        Err(SyncError::RemoteNotFound { .. })
    ));
    assert!(matches!(
        a.push("nowhere", &spec(), &anonymous()),
        Err(SyncError::RemoteNotFound { .. })
    ));
}

#[test]
fn auth_failure_changes_nothing() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    let b = cluster.peer("b");
    put(&a, "refs/vault/x", b"x");
    a.push(HUB, &spec(), &anonymous()).unwrap();
    put(&b, "refs/vault/y", b"y");

    assert!(matches!(
        b.pull(HUB, &spec(), &refused),
        Err(SyncError::Auth { .. })
    ));
    assert!(matches!(
        b.push(HUB, &spec(), &refused),
        Err(SyncError::Auth { .. })
    ));

    assert_eq!(names(&b), set(&["refs/vault/y"]));
    assert_eq!(names(&cluster.hub()), set(&["refs/vault/x"]));
}

#[test]
fn unreachable_remote_is_a_fetch_error() {
    let cluster = Cluster::new();
    let a = Repository::initialize(
        &cluster.path("a"),
        HUB,
        &cluster.path("missing.git").display().to_string(),
        &ns(),
    )
    .unwrap();

    assert!(matches!(
        a.pull(HUB, &spec(), &anonymous()),
        Err(SyncError::Fetch { .. })
    ));
}

#[test]
fn unreadable_remote_config_is_a_remote_error() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");

    let mut config = std::fs::OpenOptions::new()
        .append(true)
        .open(cluster.path("a").join(".git/config"))
        .unwrap();
    config
        .write_all(b"[remote \"broken\"]\n\turl = /srv/\xffhub.git\n")
        .unwrap();
    drop(config);

    let err = a.pull("broken", &spec(), &anonymous()).unwrap_err();
    assert!(matches!(err, SyncError::Remote { .. }));
    assert!(err.to_string().contains("broken"));
}

// =============================================================================
// Clone
// =============================================================================

#[test]
fn clone_then_pull_namespace() {
    let cluster = Cluster::new();
    let a = cluster.peer("a");
    put(&a, "refs/vault/x", b"x");
    a.push(HUB, &spec(), &anonymous()).unwrap();

    let path = cluster.path("clone");
    let cloned = Repository::clone(&cluster.hub_url(), HUB, &path, &anonymous()).unwrap();
    assert_eq!(cloned.remote(HUB).unwrap().url, cluster.hub_url());

    cloned.pull(HUB, &spec(), &anonymous()).unwrap();
    assert_eq!(names(&cloned), set(&["refs/vault/x"]));
}

#[test]
fn clone_with_refused_credentials() {
    let cluster = Cluster::new();
    let path = cluster.path("clone");

    assert!(matches!(
        Repository::clone(&cluster.hub_url(), HUB, &path, &refused),
        Err(RepoError::Auth { .. })
    ));
    assert!(!path.exists());
}

#[test]
fn sync_events_reach_observer() {
    let cluster = Cluster::new();
    let (observer, capture) = capturing();
    let a = cluster.peer("a").with_observer(observer);
    put(&a, "refs/vault/x", b"x");

    a.push(HUB, &spec(), &anonymous()).unwrap();
    a.pull(HUB, &spec(), &anonymous()).unwrap();

    let logged = capture.text();
    assert!(logged.contains("push plan"));
    assert!(logged.contains("up to date"));
}
