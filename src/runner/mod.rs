//! Task execution engine
//!
//! This module handles task registration, dependency resolution and the
//! concurrent execution of dependencies.

pub mod build;
pub mod context;
pub mod registry;
pub mod task;

// Re-export main types
pub use build::*;
pub use context::*;
pub use registry::*;
pub use task::*;
