//! Repository creation: `rv init`, `rv init-bare`, `rv clone`.

use std::str::FromStr;

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::config::{Config, RepoConfig};
use crate::core::types::{Namespace, RefSpec};
use crate::repo::Repository;
use crate::sync::SyncOutcome;
use crate::ui::output;

/// Remote name and namespace from flags, falling back to configuration.
fn settings(
    config: &Config,
    remote: Option<&str>,
    namespace: Option<&str>,
) -> Result<(String, Namespace)> {
    let remote = remote.unwrap_or(config.remote()).to_string();
    let namespace = match namespace {
        Some(ns) => Namespace::from_str(ns).context("invalid --namespace")?,
        None => config.namespace()?,
    };
    Ok((remote, namespace))
}

fn record(repo: &Repository, remote: &str, namespace: &Namespace) -> Result<()> {
    let path = Config::write_repo(
        repo.paths(),
        &RepoConfig {
            remote: Some(remote.to_string()),
            namespace: Some(namespace.to_string()),
            auth: None,
        },
    )?;
    tracing::debug!(path = %path.display(), "wrote repo config");
    Ok(())
}

/// Create a repository with one remote.
pub fn init(ctx: &Context, url: &str, remote: Option<&str>, namespace: Option<&str>) -> Result<()> {
    let config = ctx.config(None)?;
    let (remote, namespace) = settings(&config, remote, namespace)?;

    let repo = Repository::initialize(&ctx.repo, &remote, url, &namespace)?;
    record(&repo, &remote, &namespace)?;

    output::print(
        format!(
            "Initialized refvault repository in {} (remote {} -> {}, namespace {})",
            repo.path().display(),
            remote,
            url,
            namespace
        ),
        ctx.verbosity,
    );
    Ok(())
}

/// Create an empty bare hub.
pub fn init_bare(ctx: &Context) -> Result<()> {
    let repo = Repository::initialize_bare(&ctx.repo)?;
    output::print(
        format!(
            "Initialized bare refvault repository in {}",
            repo.path().display()
        ),
        ctx.verbosity,
    );
    Ok(())
}

/// Clone a remote, then pull its namespace.
///
/// The clone itself only brings over branches, so the namespace is fetched
/// separately right after.
pub fn clone(
    ctx: &Context,
    url: &str,
    remote: Option<&str>,
    namespace: Option<&str>,
) -> Result<()> {
    let config = ctx.config(None)?;
    let (remote, namespace) = settings(&config, remote, namespace)?;
    let resolver = ctx.resolver(&config);

    let mut repo = Repository::clone(url, &remote, &ctx.repo, &resolver)?;
    record(&repo, &remote, &namespace)?;

    let spec = RefSpec::mirror(namespace.clone());
    let outcome =
        repo.with_lock(|repo| -> Result<_> { Ok(repo.pull(&remote, &spec, &resolver)?) })?;
    if outcome == SyncOutcome::EmptyRemote {
        output::warn(format!("{} has no references yet", url), ctx.verbosity);
    }

    output::print(
        format!(
            "Cloned {} into {} (namespace {}, {})",
            url,
            repo.path().display(),
            namespace,
            outcome
        ),
        ctx.verbosity,
    );
    Ok(())
}
