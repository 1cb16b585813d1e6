//! Reference commands: `rv update`, `rv delete`, `rv list`.

use std::str::FromStr;

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::types::{Digest, Namespace, RefName, Reference};
use crate::ui::output;

/// Point `name` at `digest`.
pub fn update(ctx: &Context, name: &str, digest: &str) -> Result<()> {
    let name = RefName::new(name).context("invalid reference name")?;
    let digest = Digest::new(digest).context("invalid digest")?;
    let reference = Reference::new(name, digest);

    let mut repo = ctx.open()?;
    repo.with_lock(|repo| -> Result<()> { Ok(repo.update(&reference)?) })?;

    output::print(format!("Updated {}", reference), ctx.verbosity);
    Ok(())
}

/// Remove the reference `name`.
pub fn delete(ctx: &Context, name: &str) -> Result<()> {
    let name = RefName::new(name).context("invalid reference name")?;

    let mut repo = ctx.open()?;
    repo.with_lock(|repo| -> Result<()> { Ok(repo.delete_name(&name)?) })?;

    output::print(format!("Deleted {}", name), ctx.verbosity);
    Ok(())
}

/// Print the references in a namespace, one `<digest> <name>` per line.
pub fn list(ctx: &Context, namespace: Option<&str>, all: bool) -> Result<()> {
    let repo = ctx.open()?;
    let namespace = if all {
        Namespace::root()
    } else {
        match namespace {
            Some(ns) => Namespace::from_str(ns).context("invalid namespace")?,
            None => ctx.config(Some(&repo))?.namespace()?,
        }
    };

    let refs = repo.list(&namespace)?;
    if !refs.is_empty() {
        println!("{}", output::format_references(&refs));
    }
    Ok(())
}
