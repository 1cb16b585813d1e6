//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tracing::Dispatch;

use refvault::auth::{AuthMethod, StaticResolver};
use refvault::core::types::{Namespace, RefName, RefSpec, Reference};
use refvault::observe::Observer;
use refvault::repo::Repository;

/// Name every peer uses for the hub remote.
pub const HUB: &str = "hub";

pub fn ns() -> Namespace {
    Namespace::new("refs/vault").unwrap()
}

pub fn spec() -> RefSpec {
    RefSpec::mirror(ns())
}

pub fn anonymous() -> StaticResolver {
    StaticResolver::new(AuthMethod::Anonymous)
}

// =============================================================================
// Repositories
// =============================================================================

/// A bare hub plus any number of peers, all in one temp dir.
pub struct Cluster {
    dir: TempDir,
}

impl Cluster {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Repository::initialize_bare(&dir.path().join("hub.git")).expect("failed to create hub");
        Self { dir }
    }

    pub fn hub_path(&self) -> PathBuf {
        self.dir.path().join("hub.git")
    }

    pub fn hub_url(&self) -> String {
        self.hub_path().display().to_string()
    }

    pub fn hub(&self) -> Repository {
        Repository::open(&self.hub_path()).expect("failed to open hub")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Create a peer whose `hub` remote replicates `refs/vault/`.
    pub fn peer(&self, name: &str) -> Repository {
        Repository::initialize(&self.path(name), HUB, &self.hub_url(), &ns())
            .expect("failed to create peer")
    }
}

/// Store `content` and bind `name` to it.
pub fn put(repo: &Repository, name: &str, content: &[u8]) -> Reference {
    let digest = repo.write(content).unwrap();
    let reference = Reference::new(RefName::new(name).unwrap(), digest);
    repo.update(&reference).unwrap();
    reference
}

/// Sorted names of every reference under `refs/vault/`.
pub fn names(repo: &Repository) -> BTreeSet<String> {
    repo.list(&ns())
        .unwrap()
        .into_iter()
        .map(|r| r.name.to_string())
        .collect()
}

/// Count loose and packed object files in a repository.
pub fn object_files(repo: &Repository) -> usize {
    fn walk(dir: &Path) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        entries
            .flatten()
            .map(|entry| {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path)
                } else {
                    1
                }
            })
            .sum()
    }
    walk(&repo.paths().objects_dir())
}

// =============================================================================
// Event capture
// =============================================================================

#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// An observer that records every event as plain text.
pub fn capturing() -> (Observer, Capture) {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    (Observer::new(Dispatch::new(subscriber)), capture)
}
