//! auth::errors
//!
//! Credential resolution errors.
//!
//! Error messages name the URL being resolved and never carry secret
//! material.

use thiserror::Error;

/// Errors from resolving credentials for a remote.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The URL scheme has no credential strategy.
    #[error("unsupported remote url '{url}'")]
    UnsupportedUrl {
        /// The URL that could not be classified
        url: String,
    },

    /// A credential the strategy requires is not available.
    #[error("missing credential for '{url}': {message}")]
    MissingCredential {
        /// The remote URL
        url: String,
        /// What is missing
        message: String,
    },

    /// The resolver itself failed.
    #[error("credential resolver failed for '{url}': {message}")]
    Resolver {
        /// The remote URL
        url: String,
        /// Description of the failure
        message: String,
    },
}

impl AuthError {
    /// The URL the failed resolution was for.
    pub fn url(&self) -> &str {
        match self {
            AuthError::UnsupportedUrl { url }
            | AuthError::MissingCredential { url, .. }
            | AuthError::Resolver { url, .. } => url,
        }
    }
}
