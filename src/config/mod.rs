//! Process configuration
//!
//! This module reads the settings that control whether builds may run at all.

pub mod env;

// Re-export main types
pub use env::*;
