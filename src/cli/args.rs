//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--repo <path>`: Operate on the repository at this path
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// refvault - content-addressed blobs and references on git
#[derive(Parser, Debug)]
#[command(name = "rv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to operate on
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    // ========== Lifecycle ==========
    /// Create a repository with one remote
    #[command(
        name = "init",
        after_help = "\
EXAMPLES:
    # Vault replicated through a shared bare hub
    rv --repo ~/vault init /srv/hub.git

    # Custom remote name and namespace
    rv --repo ~/vault init ssh://git@example.com/hub.git --remote hub --namespace refs/team"
    )]
    Init {
        /// URL of the remote peer
        url: String,

        /// Remote name (default: configured remote, else "origin")
        #[arg(long)]
        remote: Option<String>,

        /// Reference namespace to replicate (default: configured, else refs/vault)
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Create an empty bare repository to serve as a hub
    #[command(name = "init-bare")]
    InitBare,

    /// Clone a remote into --repo without checking out files
    Clone {
        /// URL to clone
        url: String,

        /// Remote name (default: configured remote, else "origin")
        #[arg(long)]
        remote: Option<String>,

        /// Reference namespace to replicate (default: configured, else refs/vault)
        #[arg(long)]
        namespace: Option<String>,
    },

    // ========== Objects ==========
    /// Store content and print its digest
    Write {
        /// File to store (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Print the content stored under a digest
    Cat {
        /// Digest to read
        digest: String,
    },

    // ========== References ==========
    /// Point a reference at a digest
    Update {
        /// Full reference name (refs/...)
        name: String,

        /// Target digest
        digest: String,
    },

    /// Delete a reference
    Delete {
        /// Full reference name (refs/...)
        name: String,
    },

    /// List references in a namespace
    List {
        /// Namespace to list (default: configured namespace)
        namespace: Option<String>,

        /// List every reference regardless of namespace
        #[arg(long, conflicts_with = "namespace")]
        all: bool,
    },

    // ========== Synchronization ==========
    /// Fetch the namespace from a remote
    Pull {
        /// Remote name (default: configured remote)
        remote: Option<String>,
    },

    /// Push the namespace to a remote, deleting references removed locally
    Push {
        /// Remote name (default: configured remote)
        remote: Option<String>,
    },

    /// Pull, then push
    Sync {
        /// Remote name (default: configured remote)
        remote: Option<String>,
    },

    // ========== Locking ==========
    /// Show whether the repository lock is held
    #[command(name = "lock-status")]
    LockStatus,
}
