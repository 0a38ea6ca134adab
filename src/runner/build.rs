//! Build harness
//!
//! A `Build` combines a task registry with a root context and the metadata used
//! for help output.

use crate::config::Settings;
use crate::error::{RegistryResult, RunError, RunResult};
use crate::help;
use crate::runner::{Context, RegisteredTask, Registry, Task};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Information about the build program, shown in help output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    /// Program name, defaults to the executable's file name
    pub name: String,
    pub usage: String,
    pub version: String,
    pub author: String,
    pub email: String,
    pub license: String,
}

impl Default for Meta {
    fn default() -> Self {
        let name = std::env::args()
            .next()
            .and_then(|arg0| {
                Path::new(&arg0)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "kargar".to_string());

        Meta {
            name,
            usage: String::new(),
            version: String::new(),
            author: String::new(),
            email: String::new(),
            license: String::new(),
        }
    }
}

/// Register tasks and their dependencies, then run them by name.
///
/// Cloning is cheap and clones share the registry, so a task action can hold a
/// clone and call [`Build::run_for`] to run other tasks.
#[derive(Debug, Clone, Default)]
pub struct Build {
    pub meta: Meta,
    ctx: Context,
    registry: Arc<Registry>,
    limiter: Option<Arc<Semaphore>>,
}

impl Build {
    /// A build whose root context is never cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// A build using the provided root context
    pub fn with_context(ctx: Context) -> Self {
        Build {
            ctx,
            ..Default::default()
        }
    }

    /// Set the metadata shown in help output
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Allow at most `limit` task actions to execute at the same time.
    ///
    /// Only action bodies take a permit, waiting on dependencies does not.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    /// The root context
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Register tasks. Circular dependencies are not allowed.
    pub fn add<I>(&self, tasks: I) -> RegistryResult<()>
    where
        I: IntoIterator<Item = Task>,
    {
        self.registry.add(tasks)
    }

    /// Look up a registered task
    pub fn task(&self, name: &str) -> Option<Arc<RegisteredTask>> {
        self.registry.get(name)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run the named tasks in order with the root context
    pub async fn run<S>(&self, tasks: &[S]) -> RunResult<()>
    where
        S: AsRef<str> + Sync,
    {
        self.run_for(self.ctx.clone(), tasks).await
    }

    /// Run the named tasks in order with another context.
    ///
    /// Use this to run tasks from inside an action while keeping the caller's
    /// context as the parent. Stops at the first task that fails.
    pub async fn run_for<S>(&self, ctx: Context, tasks: &[S]) -> RunResult<()>
    where
        S: AsRef<str> + Sync,
    {
        if !Settings::from_env()?.enabled {
            return Err(RunError::Disabled);
        }

        for name in tasks {
            let name = name.as_ref();
            if ctx.is_cancelled() {
                self.ctx.warn("Build cancelled.");
                continue;
            }
            let task = self
                .registry
                .get(name)
                .ok_or_else(|| RunError::NoSuchTask(name.to_string()))?;
            task.run(ctx.clone(), self.limiter.clone()).await?;
        }
        Ok(())
    }

    /// Help text for the whole build
    pub fn help(&self) -> String {
        help::render_build_help(&self.meta, &self.registry.summaries(), &[])
    }

    /// Help text for one task
    pub fn task_help(&self, name: &str) -> Option<String> {
        self.task(name).map(|t| help::render_task_help(&t, &[]))
    }
}
