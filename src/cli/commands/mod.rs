//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Opens the repository and loads its configuration
//! 3. Runs mutating work under the repository lock
//! 4. Formats and displays output

mod lifecycle;
mod lock;
mod objects;
mod refs;
mod sync;

pub use lifecycle::{clone, init, init_bare};
pub use lock::lock_status;
pub use objects::{cat, write};
pub use refs::{delete, list, update};
pub use sync::{pull, push, sync};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::args::Command;
use crate::auth::{AuthError, DefaultResolver};
use crate::core::config::Config;
use crate::repo::Repository;
use crate::ui::output::Verbosity;
use crate::ui::prompts;

/// Execution context shared by all handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Repository path from `--repo`
    pub repo: PathBuf,
    /// Output verbosity
    pub verbosity: Verbosity,
}

impl Context {
    /// Open the repository at `--repo`.
    pub fn open(&self) -> Result<Repository> {
        Repository::open(&self.repo)
            .with_context(|| format!("no refvault repository at {}", self.repo.display()))
    }

    /// Load configuration, with repository overrides when one is given.
    pub fn config(&self, repo: Option<&Repository>) -> Result<Config> {
        let config = match repo {
            Some(repo) => repo.config()?,
            None => Config::load(None)?,
        };
        Ok(config)
    }

    /// Build the credential resolver from configuration.
    pub fn resolver(&self, config: &Config) -> DefaultResolver {
        DefaultResolver::new(config.auth()).with_passphrase(|key| {
            prompts::passphrase(key).map_err(|e| AuthError::Resolver {
                url: key.display().to_string(),
                message: e.to_string(),
            })
        })
    }
}

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init {
            url,
            remote,
            namespace,
        } => init(ctx, &url, remote.as_deref(), namespace.as_deref()),
        Command::InitBare => init_bare(ctx),
        Command::Clone {
            url,
            remote,
            namespace,
        } => clone(ctx, &url, remote.as_deref(), namespace.as_deref()),
        Command::Write { file } => write(ctx, file.as_deref()),
        Command::Cat { digest } => cat(ctx, &digest),
        Command::Update { name, digest } => update(ctx, &name, &digest),
        Command::Delete { name } => delete(ctx, &name),
        Command::List { namespace, all } => list(ctx, namespace.as_deref(), all),
        Command::Pull { remote } => pull(ctx, remote.as_deref()),
        Command::Push { remote } => push(ctx, remote.as_deref()),
        Command::Sync { remote } => sync(ctx, remote.as_deref()),
        Command::LockStatus => lock_status(ctx),
    }
}
