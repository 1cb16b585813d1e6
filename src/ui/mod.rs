//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Interactive prompts (key passphrases)
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All terminal output and prompts go through this module so that quiet
//! mode is honored consistently. Library code never writes to the
//! terminal; it emits `tracing` events instead.

pub mod output;
pub mod prompts;
