//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$REFVAULT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/refvault/config.toml`
//! 3. `~/.refvault/config.toml`
//!
//! # Repo Config
//!
//! Located at `<git_dir>/refvault/config.toml`, which is `.git/refvault/`
//! for ordinary repositories and `refvault/` at the root of bare ones.
//!
//! # Validation
//!
//! Config values are validated after parsing: namespaces must be valid
//! reference prefixes and names must be non-empty.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::Namespace;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// remote = "origin"
/// namespace = "refs/vault"
///
/// [auth]
/// ssh_user = "git"
/// ssh_key = "/home/me/.ssh/id_ed25519"
/// prompt_passphrase = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default remote name
    pub remote: Option<String>,

    /// Default reference namespace
    pub namespace: Option<String>,

    /// Credential settings
    pub auth: Option<AuthConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_common(self.remote.as_deref(), self.namespace.as_deref())?;
        if let Some(auth) = &self.auth {
            auth.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// Written by `rv init` so later commands know which remote and namespace
/// the repository was set up with.
///
/// # Example
///
/// ```toml
/// remote = "hub"
/// namespace = "refs/team/secrets"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Remote name
    pub remote: Option<String>,

    /// Reference namespace
    pub namespace: Option<String>,

    /// Credential overrides for this repository
    pub auth: Option<AuthConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_common(self.remote.as_deref(), self.namespace.as_deref())?;
        if let Some(auth) = &self.auth {
            auth.validate()?;
        }
        Ok(())
    }
}

fn validate_common(remote: Option<&str>, namespace: Option<&str>) -> Result<(), ConfigError> {
    if let Some(remote) = remote {
        if remote.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "remote cannot be empty".to_string(),
            ));
        }
    }

    if let Some(namespace) = namespace {
        Namespace::new(namespace)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid namespace: {}", e)))?;
    }

    Ok(())
}

/// Credential settings consumed by [`crate::auth::DefaultResolver`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Username for ssh remotes whose URL names none
    pub ssh_user: Option<String>,

    /// Private key file for ssh remotes
    pub ssh_key: Option<PathBuf>,

    /// Public key file matching `ssh_key`
    pub ssh_public_key: Option<PathBuf>,

    /// Ask for the private key passphrase interactively
    pub prompt_passphrase: Option<bool>,

    /// Fall back to the ssh agent when no key file is configured
    pub use_agent: Option<bool>,
}

impl AuthConfig {
    /// Validate the credential settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(user) = &self.ssh_user {
            if user.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "auth.ssh_user cannot be empty".to_string(),
                ));
            }
        }
        if self.ssh_public_key.is_some() && self.ssh_key.is_none() {
            return Err(ConfigError::InvalidValue(
                "auth.ssh_public_key requires auth.ssh_key".to_string(),
            ));
        }
        if self.prompt_passphrase == Some(true) && self.ssh_key.is_none() {
            return Err(ConfigError::InvalidValue(
                "auth.prompt_passphrase requires auth.ssh_key".to_string(),
            ));
        }
        Ok(())
    }

    /// Overlay `other` on top of `self`, field by field.
    pub fn merged_with(&self, other: &AuthConfig) -> AuthConfig {
        AuthConfig {
            ssh_user: other.ssh_user.clone().or_else(|| self.ssh_user.clone()),
            ssh_key: other.ssh_key.clone().or_else(|| self.ssh_key.clone()),
            ssh_public_key: other
                .ssh_public_key
                .clone()
                .or_else(|| self.ssh_public_key.clone()),
            prompt_passphrase: other.prompt_passphrase.or(self.prompt_passphrase),
            use_agent: other.use_agent.or(self.use_agent),
        }
    }

    /// Whether to prompt for a passphrase. Defaults to `false`.
    pub fn prompt_passphrase(&self) -> bool {
        self.prompt_passphrase.unwrap_or(false)
    }

    /// Whether the ssh agent may be used. Defaults to `true`.
    pub fn use_agent(&self) -> bool {
        self.use_agent.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = GlobalConfig::default();
            assert!(config.remote.is_none());
            assert!(config.namespace.is_none());
            assert!(config.auth.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_namespace() {
            let config = GlobalConfig {
                namespace: Some("heads/main".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn roundtrip() {
            let config = GlobalConfig {
                remote: Some("origin".to_string()),
                namespace: Some("refs/vault".to_string()),
                auth: Some(AuthConfig {
                    ssh_user: Some("git".to_string()),
                    ssh_key: Some(PathBuf::from("/keys/id_ed25519")),
                    ssh_public_key: None,
                    prompt_passphrase: Some(true),
                    use_agent: Some(false),
                }),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: GlobalConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }
    }

    mod repo_config {
        use super::*;

        #[test]
        fn empty_remote_rejected() {
            let config = RepoConfig {
                remote: Some("  ".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn valid_namespace() {
            let config = RepoConfig {
                namespace: Some("refs/team/secrets/".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                remote = "origin"
                trunk = "main"
            "#;

            let result: Result<RepoConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }
    }

    mod auth_config {
        use super::*;

        #[test]
        fn public_key_without_private_key_rejected() {
            let config = AuthConfig {
                ssh_public_key: Some(PathBuf::from("/keys/id.pub")),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn prompt_without_key_rejected() {
            let config = AuthConfig {
                prompt_passphrase: Some(true),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn merge_prefers_overlay() {
            let base = AuthConfig {
                ssh_user: Some("git".to_string()),
                use_agent: Some(true),
                ..Default::default()
            };
            let overlay = AuthConfig {
                use_agent: Some(false),
                ..Default::default()
            };
            let merged = base.merged_with(&overlay);
            assert_eq!(merged.ssh_user.as_deref(), Some("git"));
            assert!(!merged.use_agent());
        }

        #[test]
        fn accessor_defaults() {
            let config = AuthConfig::default();
            assert!(!config.prompt_passphrase());
            assert!(config.use_agent());
        }
    }
}
