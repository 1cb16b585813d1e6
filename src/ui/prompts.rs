//! ui::prompts
//!
//! Interactive prompts.
//!
//! Prompts read from the controlling terminal, never from stdin, so piped
//! content (as in `rv write < file`) is not consumed by a prompt.

use std::io::IsTerminal;
use std::path::Path;

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Whether a person is at the terminal to answer prompts.
pub fn interactive() -> bool {
    std::io::stderr().is_terminal()
}

/// Prompt for masked input (passwords, passphrases).
///
/// The input is not echoed to the terminal.
pub fn password(message: &str) -> Result<String, PromptError> {
    if !interactive() {
        return Err(PromptError::NotInteractive);
    }
    rpassword::prompt_password(message).map_err(|e| PromptError::IoError(e.to_string()))
}

/// Prompt for the passphrase of an ssh private key.
pub fn passphrase(key: &Path) -> Result<String, PromptError> {
    password(&format!("Passphrase for {}: ", key.display()))
}
