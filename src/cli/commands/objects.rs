//! Content commands: `rv write`, `rv cat`.

use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::types::Digest;

/// Store a file (or stdin) and print its digest.
pub fn write(ctx: &Context, file: Option<&Path>) -> Result<()> {
    let content = match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let mut repo = ctx.open()?;
    let digest = repo.with_lock(|repo| -> Result<Digest> { Ok(repo.write(&content)?) })?;

    println!("{}", digest);
    Ok(())
}

/// Write the content stored under `digest` to stdout.
pub fn cat(ctx: &Context, digest: &str) -> Result<()> {
    let digest = Digest::new(digest).context("invalid digest")?;
    let repo = ctx.open()?;
    let content = repo.cat(&digest)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(())
}
