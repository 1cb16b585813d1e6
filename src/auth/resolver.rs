//! auth::resolver
//!
//! Stock [`AuthResolver`] implementations.
//!
//! # Resolution Rules
//!
//! [`DefaultResolver`] picks a strategy from the URL kind:
//! - local paths and `file://` resolve to [`AuthMethod::Anonymous`]
//! - `ssh://` and scp-like URLs use the configured key, else the agent
//! - `http(s)://` delegates to the git credential helper
//! - anything else is [`AuthError::UnsupportedUrl`]

use std::path::Path;

use super::{AuthError, AuthMethod, AuthResolver, RemoteUrl, UrlKind};
use crate::core::config::AuthConfig;

/// Login used for ssh remotes when neither the URL nor config names one.
const DEFAULT_SSH_USER: &str = "git";

/// A resolver that answers every URL with the same method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResolver(pub AuthMethod);

impl StaticResolver {
    /// Create a resolver that always returns `method`.
    pub fn new(method: AuthMethod) -> Self {
        Self(method)
    }
}

impl AuthResolver for StaticResolver {
    fn resolve(&self, _url: &str) -> Result<AuthMethod, AuthError> {
        Ok(self.0.clone())
    }
}

type PassphraseSource = Box<dyn Fn(&Path) -> Result<String, AuthError>>;

/// Config-driven resolver.
///
/// Passphrase prompting is injected with [`DefaultResolver::with_passphrase`]
/// so the library never reads from a terminal itself.
pub struct DefaultResolver {
    config: AuthConfig,
    passphrase: Option<PassphraseSource>,
}

impl std::fmt::Debug for DefaultResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultResolver")
            .field("config", &self.config)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<source>"))
            .finish()
    }
}

impl DefaultResolver {
    /// Create a resolver from credential settings.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            passphrase: None,
        }
    }

    /// Supply the passphrase for a key file when `prompt_passphrase` is set.
    pub fn with_passphrase<F>(mut self, source: F) -> Self
    where
        F: Fn(&Path) -> Result<String, AuthError> + 'static,
    {
        self.passphrase = Some(Box::new(source));
        self
    }

    fn resolve_ssh(&self, url: &str, parsed: &RemoteUrl) -> Result<AuthMethod, AuthError> {
        let username = parsed
            .username
            .clone()
            .or_else(|| self.config.ssh_user.clone())
            .unwrap_or_else(|| DEFAULT_SSH_USER.to_string());

        if let Some(key) = &self.config.ssh_key {
            if !key.exists() {
                return Err(AuthError::MissingCredential {
                    url: url.to_string(),
                    message: format!("ssh key not found: {}", key.display()),
                });
            }

            let passphrase = if self.config.prompt_passphrase() {
                let source = self
                    .passphrase
                    .as_ref()
                    .ok_or_else(|| AuthError::MissingCredential {
                        url: url.to_string(),
                        message: "passphrase required but no prompt is available".to_string(),
                    })?;
                Some(source(key.as_path())?)
            } else {
                None
            };

            return Ok(AuthMethod::SshKey {
                username,
                private_key: key.clone(),
                public_key: self.config.ssh_public_key.clone(),
                passphrase,
            });
        }

        if self.config.use_agent() {
            return Ok(AuthMethod::SshAgent { username });
        }

        Err(AuthError::MissingCredential {
            url: url.to_string(),
            message: "no ssh key configured and agent use is disabled".to_string(),
        })
    }
}

impl AuthResolver for DefaultResolver {
    fn resolve(&self, url: &str) -> Result<AuthMethod, AuthError> {
        let parsed = RemoteUrl::parse(url)?;
        let method = match parsed.kind {
            UrlKind::Local => AuthMethod::Anonymous,
            UrlKind::Http => AuthMethod::CredentialHelper {
                username: parsed.username,
            },
            UrlKind::Ssh => self.resolve_ssh(url, &parsed)?,
        };
        tracing::trace!(url, method = method.kind(), "resolved credentials");
        Ok(method)
    }
}
