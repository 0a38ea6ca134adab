//! Error types for Kargar

use thiserror::Error;

/// Result type alias for Kargar operations
pub type Result<T> = std::result::Result<T, KargarError>;

/// Main error type for Kargar
#[derive(Error, Debug)]
pub enum KargarError {
    /// Task registration errors
    #[error("Registration error: {0}")]
    Registry(#[from] RegistryError),

    /// Task run errors
    #[error("Run error: {0}")]
    Run(#[from] RunError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Command-line parsing errors
    #[error("{0}")]
    Cli(#[from] clap::Error),
}

/// Errors returned by `Registry::add` for an invalid task definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Task {index} is missing a name")]
    MissingName { index: usize },

    #[error("Task '{0}' is missing an action")]
    MissingAction(String),

    #[error("Task '{0}' is missing usage")]
    MissingUsage(String),

    #[error("Duplicate task: '{0}'")]
    DuplicateTask(String),

    #[error("Task '{dependency}' is not registered, required by task '{task}'")]
    UnknownDependency { dependency: String, task: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}

/// Errors returned while running tasks
#[derive(Error, Debug)]
pub enum RunError {
    #[error("No such task: '{0}'")]
    NoSuchTask(String),

    #[error("KARGAR=false, escaping run")]
    Disabled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Task '{task}' failed: {source}")]
    Action {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("A dependency of task '{0}' panicked")]
    Panicked(String),
}

/// Terminal error of a cancelled context
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}, expected a boolean")]
    InvalidKillSwitch { var: String, value: String },
}

/// Specialized result type for registration operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Specialized result type for run operations
pub type RunResult<T> = std::result::Result<T, RunError>;

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl RunError {
    /// Convert the error returned by a task action.
    ///
    /// Cancellation and errors from nested runs keep their identity instead of
    /// being wrapped as an opaque action failure.
    pub(crate) fn from_action(task: &str, err: anyhow::Error) -> Self {
        let err = match err.downcast::<RunError>() {
            Ok(run) => return run,
            Err(err) => err,
        };
        match err.downcast::<ContextError>() {
            Ok(ctx) => RunError::Context(ctx),
            Err(source) => RunError::Action {
                task: task.to_string(),
                source,
            },
        }
    }

    /// Whether this error is exactly the cancellation value
    pub fn is_canceled(&self) -> bool {
        matches!(self, RunError::Context(ContextError::Canceled))
    }
}
