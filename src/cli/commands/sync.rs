//! Replication commands: `rv pull`, `rv push`, `rv sync`.
//!
//! All three replicate the configured namespace and run under the lock.

use anyhow::Result;

use super::Context;
use crate::core::types::RefSpec;
use crate::sync::SyncOutcome;
use crate::ui::output;

#[derive(Clone, Copy)]
enum Direction {
    Pull,
    Push,
    Both,
}

fn run(ctx: &Context, remote: Option<&str>, direction: Direction) -> Result<()> {
    let mut repo = ctx.open()?;
    let config = ctx.config(Some(&repo))?;
    let remote = remote.unwrap_or(config.remote()).to_string();
    let spec = RefSpec::mirror(config.namespace()?);
    let resolver = ctx.resolver(&config);

    let outcomes = repo.with_lock(|repo| -> Result<Vec<(&'static str, SyncOutcome)>> {
        let mut outcomes = Vec::new();
        if matches!(direction, Direction::Pull | Direction::Both) {
            outcomes.push(("pull", repo.pull(&remote, &spec, &resolver)?));
        }
        if matches!(direction, Direction::Push | Direction::Both) {
            outcomes.push(("push", repo.push(&remote, &spec, &resolver)?));
        }
        Ok(outcomes)
    })?;

    for (verb, outcome) in outcomes {
        output::print(format!("{} {}: {}", verb, remote, outcome), ctx.verbosity);
    }
    Ok(())
}

/// Fetch the namespace from `remote`.
pub fn pull(ctx: &Context, remote: Option<&str>) -> Result<()> {
    run(ctx, remote, Direction::Pull)
}

/// Push the namespace to `remote`.
pub fn push(ctx: &Context, remote: Option<&str>) -> Result<()> {
    run(ctx, remote, Direction::Push)
}

/// Pull, then push, under one lock.
pub fn sync(ctx: &Context, remote: Option<&str>) -> Result<()> {
    run(ctx, remote, Direction::Both)
}
