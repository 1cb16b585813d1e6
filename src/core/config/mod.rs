//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! refvault has two configuration scopes:
//! - **Global**: User-level settings (default remote, namespace, credentials)
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$REFVAULT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/refvault/config.toml`
//! 3. `~/.refvault/config.toml`
//!
//! # Repo Config Location
//!
//! `<git_dir>/refvault/config.toml`, routed through [`VaultPaths`].
//!
//! # Example
//!
//! ```no_run
//! use refvault::core::config::Config;
//! use refvault::core::paths::VaultPaths;
//! use std::path::PathBuf;
//!
//! let paths = VaultPaths::new(PathBuf::from("/path/to/vault"), false);
//! let config = Config::load(Some(&paths)).unwrap();
//!
//! println!("Remote: {}", config.remote());
//! println!("Namespace: {}", config.namespace().unwrap());
//! ```

pub mod schema;

pub use schema::{AuthConfig, GlobalConfig, RepoConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::paths::VaultPaths;
use crate::core::types::Namespace;

/// Remote name used when nothing is configured.
pub const DEFAULT_REMOTE: &str = "origin";

/// Namespace used when nothing is configured.
pub const DEFAULT_NAMESPACE: &str = "refs/vault";

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "REFVAULT_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// This struct provides accessor methods that apply precedence rules
/// automatically. Repo config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if one was found)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `paths` is provided, also loads that repository's config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or
    /// hold invalid values. Missing config files are not an error.
    pub fn load(paths: Option<&VaultPaths>) -> Result<Config, ConfigError> {
        let global_path = Self::find_global();
        let repo_path = paths.map(VaultPaths::repo_config_path);
        Self::load_from(global_path.as_deref(), repo_path.as_deref())
    }

    /// Load configuration from explicit file locations.
    ///
    /// A `None` or nonexistent path contributes defaults.
    pub fn load_from(
        global_path: Option<&Path>,
        repo_path: Option<&Path>,
    ) -> Result<Config, ConfigError> {
        let (global, global_path) = match global_path.filter(|p| p.exists()) {
            Some(path) => (
                Self::read_config::<GlobalConfig>(path)?,
                Some(path.to_path_buf()),
            ),
            None => (GlobalConfig::default(), None),
        };

        let (repo, repo_path) = match repo_path.filter(|p| p.exists()) {
            Some(path) => (
                Some(Self::read_config::<RepoConfig>(path)?),
                Some(path.to_path_buf()),
            ),
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Locate the global config file, if any exists.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("refvault/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::home_dir()?.join(".refvault/config.toml");
        path.exists().then_some(path)
    }

    /// Read and parse a config file.
    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write repo config atomically.
    ///
    /// Creates parent directories if needed. Writes to a temp file in
    /// the same directory and renames it into place.
    pub fn write_repo(paths: &VaultPaths, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = paths.repo_config_path();
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the remote name.
    ///
    /// Defaults to "origin" if not configured.
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .or(self.global.remote.as_deref())
            .unwrap_or(DEFAULT_REMOTE)
    }

    /// Get the reference namespace.
    ///
    /// Defaults to `refs/vault` if not configured.
    pub fn namespace(&self) -> Result<Namespace, ConfigError> {
        let raw = self
            .repo
            .as_ref()
            .and_then(|r| r.namespace.as_deref())
            .or(self.global.namespace.as_deref())
            .unwrap_or(DEFAULT_NAMESPACE);
        Namespace::new(raw).map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    /// Get the credential settings, repo values overriding global ones.
    pub fn auth(&self) -> AuthConfig {
        let global = self.global.auth.clone().unwrap_or_default();
        match self.repo.as_ref().and_then(|r| r.auth.as_ref()) {
            Some(repo) => global.merged_with(repo),
            None => global,
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}
