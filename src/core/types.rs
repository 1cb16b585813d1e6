//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Digest`] - Content digest (git object id) of a stored blob
//! - [`RefName`] - Validated reference name under `refs/`
//! - [`Reference`] - A name bound to a digest
//! - [`Namespace`] - Segment-aligned prefix of the reference name space
//! - [`RefSpec`] - Directional mapping between a local and a remote namespace
//! - [`Remote`] - A named synchronization target
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use refvault::core::types::{Digest, Namespace, RefName};
//!
//! let name = RefName::new("refs/vault/tokens/github").unwrap();
//! let ns = Namespace::new("refs/vault/").unwrap();
//! assert!(ns.contains(&name));
//!
//! assert!(RefName::new("refs/has space").is_err());
//! assert!(Digest::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),
}

/// A content digest (SHA-1 or SHA-256 git object id).
///
/// Digests are normalized to lowercase. The store treats them as opaque
/// tokens compared by equality.
///
/// # Example
///
/// ```
/// use refvault::core::types::Digest;
///
/// let digest = Digest::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(digest.as_str(), "abc123def4567890abc123def4567890abc12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Create a new validated digest.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidDigest` if the string is not 40 or 64 hex characters.
    pub fn new(digest: impl Into<String>) -> Result<Self, TypeError> {
        let digest = digest.into().to_ascii_lowercase();
        Self::validate(&digest)?;
        Ok(Self(digest))
    }

    /// Check if this is the all-zero (null) object id.
    pub fn is_zero(&self) -> bool {
        self.0.chars().all(|c| c == '0')
    }

    fn validate(digest: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if digest.len() != 40 && digest.len() != 64 {
            return Err(TypeError::InvalidDigest(format!(
                "expected 40 or 64 hex characters, got {}",
                digest.len()
            )));
        }
        if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidDigest(
                "digest must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Digest {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Digest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated reference name.
///
/// Names live under `refs/` and follow git's refname rules
/// (see `git check-ref-format`).
///
/// # Example
///
/// ```
/// use refvault::core::types::RefName;
///
/// let name = RefName::new("refs/vault/db/password").unwrap();
/// assert_eq!(name.as_str(), "refs/vault/db/password");
///
/// assert!(RefName::new("heads/main").is_err());
/// assert!(RefName::new("refs/a..b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates git's refname
    /// rules or is not under `refs/`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
        }

        if !name.starts_with("refs/") {
            return Err(TypeError::InvalidRefName(format!(
                "ref name must start with 'refs/': {name}"
            )));
        }

        if name.ends_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '/'".into(),
            ));
        }
        if name.ends_with('.') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '.'".into(),
            ));
        }

        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{pattern}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain control characters".into(),
            ));
        }

        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidRefName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidRefName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named pointer into the object store.
///
/// References are unique by name within a repository. The target may name
/// an object that is not (yet) present locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Full reference name
    pub name: RefName,
    /// Digest of the content the reference points at
    pub target: Digest,
}

impl Reference {
    /// Create a reference binding `name` to `target`.
    pub fn new(name: RefName, target: Digest) -> Self {
        Self { name, target }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.name, self.target)
    }
}

/// A segment-aligned prefix of the reference name space.
///
/// Trailing slashes are not significant: `refs/a` and `refs/a/` name the
/// same namespace. A namespace contains a reference when the reference name
/// equals the prefix or continues it with a `/`, so `refs/ab/1` is never
/// inside `refs/a`. The empty prefix and `refs/` both name the root
/// namespace, which contains every reference.
///
/// # Example
///
/// ```
/// use refvault::core::types::{Namespace, RefName};
///
/// let ns = Namespace::new("refs/a/").unwrap();
/// assert!(ns.contains(&RefName::new("refs/a/1").unwrap()));
/// assert!(!ns.contains(&RefName::new("refs/ab/1").unwrap()));
/// assert_eq!(ns, Namespace::new("refs/a").unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    const ROOT: &'static str = "refs";

    /// Create a namespace from a prefix such as `refs/vault/`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidNamespace` if the prefix is not a valid
    /// reference path.
    pub fn new(prefix: impl Into<String>) -> Result<Self, TypeError> {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        if trimmed.is_empty() || trimmed == Self::ROOT {
            return Ok(Self::root());
        }
        RefName::validate(trimmed)
            .map_err(|e| TypeError::InvalidNamespace(format!("{prefix}: {e}")))?;
        Ok(Self(trimmed.to_string()))
    }

    /// The namespace containing every reference.
    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    /// Check if this is the root namespace.
    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    /// Check whether `name` lies inside this namespace.
    pub fn contains(&self, name: &RefName) -> bool {
        self.contains_str(name.as_str())
    }

    /// String form of [`Namespace::contains`], for names that are not
    /// validated yet (e.g. names read back from git).
    pub fn contains_str(&self, name: &str) -> bool {
        match name.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// The remainder of `name` below this namespace, without the separator.
    ///
    /// Returns `None` when `name` is outside the namespace or equal to it.
    pub fn relative<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.0.as_str())?
            .strip_prefix('/')
            .filter(|rest| !rest.is_empty())
    }

    /// Join a relative path onto this namespace.
    pub fn join(&self, relative: &str) -> String {
        format!("{}/{}", self.0, relative)
    }

    /// The glob pattern git uses for everything below this namespace.
    pub fn glob(&self) -> String {
        format!("{}/*", self.0)
    }

    /// Get the namespace prefix (without trailing slash).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Namespace {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl std::str::FromStr for Namespace {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/", self.0)
    }
}

/// A directional mapping between a local and a remote namespace.
///
/// [`RefSpec::to`] is the fetch direction (remote names into local names)
/// and [`RefSpec::from`] is the push direction (local names into remote
/// names). Both are forced: reference targets are content digests, not
/// commits, so fast-forward checks do not apply.
///
/// # Example
///
/// ```
/// use refvault::core::types::{Namespace, RefSpec};
///
/// let spec = RefSpec::mirror(Namespace::new("refs/vault/").unwrap());
/// assert_eq!(spec.to(), "+refs/vault/*:refs/vault/*");
/// assert_eq!(spec.from(), "+refs/vault/*:refs/vault/*");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefSpec {
    /// Namespace on the local side
    pub local: Namespace,
    /// Namespace on the remote side
    pub remote: Namespace,
}

impl RefSpec {
    /// Create a refspec mapping `remote` onto `local`.
    pub fn new(local: Namespace, remote: Namespace) -> Self {
        Self { local, remote }
    }

    /// Create a refspec that maps a namespace onto itself.
    pub fn mirror(namespace: Namespace) -> Self {
        Self {
            local: namespace.clone(),
            remote: namespace,
        }
    }

    /// Parse a git refspec string of the form `[+]<src>/*:<dst>/*`.
    ///
    /// `fetch` selects the orientation: for fetch refspecs the source is the
    /// remote side, for push refspecs the source is the local side.
    pub fn parse(spec: &str, fetch: bool) -> Result<Self, TypeError> {
        let body = spec.strip_prefix('+').unwrap_or(spec);
        let (src, dst) = body
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidNamespace(format!("not a refspec: {spec}")))?;
        let src = Self::pattern_namespace(src)?;
        let dst = Self::pattern_namespace(dst)?;
        Ok(if fetch {
            Self::new(dst, src)
        } else {
            Self::new(src, dst)
        })
    }

    fn pattern_namespace(pattern: &str) -> Result<Namespace, TypeError> {
        let prefix = pattern.strip_suffix('*').ok_or_else(|| {
            TypeError::InvalidNamespace(format!("refspec side must end with '*': {pattern}"))
        })?;
        Namespace::new(prefix)
    }

    /// The fetch-direction refspec string.
    pub fn to(&self) -> String {
        format!("+{}:{}", self.remote.glob(), self.local.glob())
    }

    /// The push-direction refspec string.
    pub fn from(&self) -> String {
        format!("+{}:{}", self.local.glob(), self.remote.glob())
    }

    /// Map a remote reference name to its local name.
    pub fn remote_to_local(&self, name: &str) -> Option<String> {
        self.remote.relative(name).map(|rest| self.local.join(rest))
    }

    /// Map a local reference name to its remote name.
    pub fn local_to_remote(&self, name: &str) -> Option<String> {
        self.local.relative(name).map(|rest| self.remote.join(rest))
    }
}

impl std::fmt::Display for RefSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to())
    }
}

/// A named synchronization target, as registered in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    /// Remote name (e.g. "origin")
    pub name: String,
    /// First configured URL
    pub url: String,
    /// Namespace mapping derived from the remote's fetch refspec, if it has
    /// a namespaced one
    pub refspec: Option<RefSpec>,
}
