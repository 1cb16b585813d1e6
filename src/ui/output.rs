//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout, diagnostics to stderr. Everything except errors
//! respects the quiet flag.

use std::fmt::Display;

use crate::core::types::Reference;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format references as `<digest> <name>` lines, sorted by name.
pub fn format_references<'a>(refs: impl IntoIterator<Item = &'a Reference>) -> String {
    let mut refs: Vec<&Reference> = refs.into_iter().collect();
    refs.sort_by(|a, b| a.name.cmp(&b.name));
    refs.iter()
        .map(|r| format!("{} {}", r.target, r.name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Digest, RefName};

    #[test]
    fn quiet_wins_over_debug() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn references_sorted_by_name() {
        let digest = Digest::new("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391").unwrap();
        let b = Reference::new(RefName::new("refs/v/b").unwrap(), digest.clone());
        let a = Reference::new(RefName::new("refs/v/a").unwrap(), digest);

        let text = format_references([&b, &a]);
        assert_eq!(
            text,
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391 refs/v/a\n\
             e69de29bb2d1d6434b8b29ae775ad8c2e48c5391 refs/v/b"
        );
    }
}
