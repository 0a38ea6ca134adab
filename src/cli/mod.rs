//! CLI interface and argument parsing
//!
//! This module turns a `Build` into a command-line program: task selection,
//! help output, verbosity and shell completion.

pub mod app;

// Re-export main types
pub use app::*;
