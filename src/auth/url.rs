//! auth::url
//!
//! Classification of remote URLs by credential strategy.

use super::AuthError;

/// Transport family of a remote URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// A filesystem path or `file://` URL.
    Local,
    /// `ssh://` or scp-like `user@host:path`.
    Ssh,
    /// `http://` or `https://`.
    Http,
}

/// A parsed remote URL.
///
/// # Example
///
/// ```
/// use refvault::auth::{RemoteUrl, UrlKind};
///
/// let url = RemoteUrl::parse("git@example.com:team/vault.git").unwrap();
/// assert_eq!(url.kind, UrlKind::Ssh);
/// assert_eq!(url.host.as_deref(), Some("example.com"));
/// assert_eq!(url.username.as_deref(), Some("git"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    /// Transport family
    pub kind: UrlKind,
    /// Host name, absent for local URLs
    pub host: Option<String>,
    /// Username embedded in the URL
    pub username: Option<String>,
}

impl RemoteUrl {
    /// Classify `url`.
    ///
    /// # Errors
    ///
    /// [`AuthError::UnsupportedUrl`] for empty URLs and unknown schemes.
    pub fn parse(url: &str) -> Result<Self, AuthError> {
        let unsupported = || AuthError::UnsupportedUrl {
            url: url.to_string(),
        };

        if url.trim().is_empty() {
            return Err(unsupported());
        }

        if let Some((scheme, rest)) = url.split_once("://") {
            let kind = match scheme.to_ascii_lowercase().as_str() {
                "file" => {
                    return Ok(Self {
                        kind: UrlKind::Local,
                        host: None,
                        username: None,
                    })
                }
                "ssh" | "git+ssh" | "ssh+git" => UrlKind::Ssh,
                "http" | "https" => UrlKind::Http,
                _ => return Err(unsupported()),
            };

            let authority = rest.split('/').next().unwrap_or_default();
            let (username, host_port) = match authority.rsplit_once('@') {
                Some((userinfo, host)) => {
                    let user = userinfo.split(':').next().unwrap_or_default();
                    (non_empty(user), host)
                }
                None => (None, authority),
            };
            let host = non_empty(strip_port(host_port)).ok_or_else(unsupported)?;

            return Ok(Self {
                kind,
                host: Some(host),
                username,
            });
        }

        if let Some((authority, _path)) = scp_split(url) {
            let (username, host) = match authority.rsplit_once('@') {
                Some((user, host)) => (non_empty(user), host),
                None => (None, authority),
            };
            let host = non_empty(host).ok_or_else(unsupported)?;
            return Ok(Self {
                kind: UrlKind::Ssh,
                host: Some(host),
                username,
            });
        }

        Ok(Self {
            kind: UrlKind::Local,
            host: None,
            username: None,
        })
    }
}

/// Split an scp-like `[user@]host:path`.
///
/// The colon must come before any slash, and a single-letter host is a
/// Windows drive, not a host.
fn scp_split(url: &str) -> Option<(&str, &str)> {
    let colon = url.find(':')?;
    if url.find('/').is_some_and(|slash| slash < colon) {
        return None;
    }
    let (authority, path) = (&url[..colon], &url[colon + 1..]);
    if authority.len() == 1 && authority.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((authority, path))
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host
            .split_once(']')
            .map(|(h, _)| h.trim_start_matches('['))
            .unwrap_or(host);
    }
    host.split(':').next().unwrap_or(host)
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
