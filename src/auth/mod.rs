//! auth - credential resolution for remote transports
//!
//! The library never decides *how* a user authenticates. It consumes an
//! [`AuthResolver`] capability that maps a remote URL to an [`AuthMethod`],
//! and the git layer turns that method into transport credentials.
//!
//! # Components
//!
//! - [`AuthMethod`] - The credential to present to a remote
//! - [`AuthResolver`] - Trait mapping a URL to an `AuthMethod`
//! - [`StaticResolver`] - Always answers with one fixed method
//! - [`DefaultResolver`] - Config-driven resolution by URL kind
//! - [`RemoteUrl`] - Classification of remote URLs (local, ssh, http)
//!
//! # Security
//!
//! Passwords and key passphrases MUST never appear in logs or error
//! messages. [`AuthMethod`] implements a custom `Debug` that redacts them.
//!
//! # Example
//!
//! ```
//! use refvault::auth::{AuthMethod, AuthResolver, StaticResolver};
//!
//! let resolver = StaticResolver::new(AuthMethod::Anonymous);
//! assert_eq!(resolver.resolve("/srv/hub.git").unwrap(), AuthMethod::Anonymous);
//! ```

mod errors;
mod method;
mod resolver;
mod url;

pub use errors::AuthError;
pub use method::AuthMethod;
pub use resolver::{DefaultResolver, StaticResolver};
pub use url::{RemoteUrl, UrlKind};

/// Maps a remote URL to the credential used to reach it.
///
/// Implemented for any `Fn(&str) -> Result<AuthMethod, AuthError>`, so a
/// closure can stand in for a full resolver:
///
/// ```
/// use refvault::auth::{AuthError, AuthMethod, AuthResolver};
///
/// let resolver = |_url: &str| -> Result<AuthMethod, AuthError> { Ok(AuthMethod::Anonymous) };
/// assert!(resolver.resolve("file:///tmp/hub.git").is_ok());
/// ```
pub trait AuthResolver {
    /// Resolve the credential for `url`.
    fn resolve(&self, url: &str) -> Result<AuthMethod, AuthError>;
}

impl<F> AuthResolver for F
where
    F: Fn(&str) -> Result<AuthMethod, AuthError>,
{
    fn resolve(&self, url: &str) -> Result<AuthMethod, AuthError> {
        self(url)
    }
}
