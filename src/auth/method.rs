//! auth::method
//!
//! The credential presented to a remote.

use std::path::PathBuf;

const REDACTED: &str = "<redacted>";

/// How to authenticate against one remote.
///
/// # Security
///
/// `Debug` output never includes passwords or passphrases.
///
/// ```
/// use refvault::auth::AuthMethod;
///
/// let method = AuthMethod::UserPass {
///     username: "robot".to_string(),
///     password: "hunter2".to_string(),
/// };
/// let debug = format!("{:?}", method);
/// assert!(debug.contains("robot"));
/// assert!(!debug.contains("hunter2"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// No credentials (local paths, `file://`, public transports).
    Anonymous,

    /// Keys held by the running ssh agent.
    SshAgent {
        /// Login name on the remote host
        username: String,
    },

    /// An explicit ssh key pair.
    SshKey {
        /// Login name on the remote host
        username: String,
        /// Private key file
        private_key: PathBuf,
        /// Public key file, if it is not derivable from the private key
        public_key: Option<PathBuf>,
        /// Private key passphrase
        passphrase: Option<String>,
    },

    /// Plaintext username and password (http basic).
    UserPass {
        /// Username
        username: String,
        /// Password or token
        password: String,
    },

    /// Delegate to the git credential helper configured for the URL.
    CredentialHelper {
        /// Username hint passed to the helper
        username: Option<String>,
    },
}

impl AuthMethod {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthMethod::Anonymous => "anonymous",
            AuthMethod::SshAgent { .. } => "ssh-agent",
            AuthMethod::SshKey { .. } => "ssh-key",
            AuthMethod::UserPass { .. } => "userpass",
            AuthMethod::CredentialHelper { .. } => "credential-helper",
        }
    }
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Anonymous => f.write_str("Anonymous"),
            AuthMethod::SshAgent { username } => f
                .debug_struct("SshAgent")
                .field("username", username)
                .finish(),
            AuthMethod::SshKey {
                username,
                private_key,
                public_key,
                passphrase,
            } => f
                .debug_struct("SshKey")
                .field("username", username)
                .field("private_key", private_key)
                .field("public_key", public_key)
                .field("passphrase", &passphrase.as_ref().map(|_| REDACTED))
                .finish(),
            AuthMethod::UserPass { username, .. } => f
                .debug_struct("UserPass")
                .field("username", username)
                .field("password", &REDACTED)
                .finish(),
            AuthMethod::CredentialHelper { username } => f
                .debug_struct("CredentialHelper")
                .field("username", username)
                .finish(),
        }
    }
}
