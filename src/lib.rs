//! Kargar - a concurrent build harness
//!
//! Register named tasks with their dependencies, then run any of them by name.
//! Dependencies run concurrently before the task that needs them, a failing
//! dependency cancels its siblings, and cancellation flows down through the
//! [`Context`] handed to every action.
//!
//! ```no_run
//! use kargar::{Build, Task};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let build = Build::new();
//! build.add([
//!     Task::new("fetch", "Fetch sources").action(|ctx| async move {
//!         ctx.info("fetching");
//!         Ok(())
//!     }),
//!     Task::new("build", "Compile").deps(["fetch"]).with_action(kargar::noop()),
//! ])?;
//! build.run(&["build"]).await?;
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod help;
pub mod logging;
pub mod runner;

// Re-export commonly used types
pub use error::{ContextError, KargarError, RegistryError, Result, RunError};
pub use runner::{action, noop, Action, ActionResult, Build, Context, Frame, Meta, Task, DEFAULT_TASK};

/// Current version of Kargar
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
