//! Task definitions and the recursive dependency runner
//!
//! A `Task` is what callers register. The registry turns it into a
//! `RegisteredTask`, whose dependencies are resolved to direct references, and
//! running a registered task runs all of its dependencies concurrently before
//! its own action.

use crate::error::{ContextError, RunError, RunResult};
use crate::runner::Context;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tokio::task::JoinSet;

/// Result returned by a task action
pub type ActionResult = anyhow::Result<()>;

/// The body of a task
pub type Action = Arc<dyn Fn(Context) -> BoxFuture<'static, ActionResult> + Send + Sync>;

/// Create an action from an async function or closure
pub fn action<F, Fut>(f: F) -> Action
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ActionResult> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// An action that does nothing, for tasks that only group dependencies
pub fn noop() -> Action {
    action(|_| async { Ok(()) })
}

/// A task definition
#[derive(Clone, Default)]
pub struct Task {
    /// Task name, unique within a build
    pub name: String,

    /// Short description for help text
    pub usage: String,

    /// Longer description for help text
    pub description: Option<String>,

    /// Names of the tasks that must run before this one
    pub deps: Vec<String>,

    /// Function called when the task runs
    pub action: Option<Action>,
}

impl Task {
    /// Create a task with a name and usage but no action
    pub fn new(name: impl Into<String>, usage: impl Into<String>) -> Self {
        Task {
            name: name.into(),
            usage: usage.into(),
            ..Default::default()
        }
    }

    /// Set the long description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add dependencies
    pub fn deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Set the action from an async function or closure
    pub fn action<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        self.action = Some(action(f));
        self
    }

    /// Set an already built action, such as `noop()`
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("description", &self.description)
            .field("deps", &self.deps)
            .field("action", &self.action.as_ref().map(|_| "<action>"))
            .finish()
    }
}

/// A task owned by the registry, with its dependencies resolved
pub struct RegisteredTask {
    name: String,
    usage: String,
    description: Option<String>,
    declared: Vec<String>,
    pub(crate) deps: HashMap<String, Arc<RegisteredTask>>,
    action: Action,
    lock: AsyncMutex<()>,
    running: AtomicBool,
}

impl RegisteredTask {
    pub(crate) fn new(task: Task, action: Action, deps: HashMap<String, Arc<RegisteredTask>>) -> Self {
        RegisteredTask {
            name: task.name,
            usage: task.usage,
            description: task.description,
            declared: task.deps,
            deps,
            action,
            lock: AsyncMutex::new(()),
            running: false.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Dependency names in declaration order
    pub fn deps(&self) -> &[String] {
        &self.declared
    }

    /// Whether this task's own action is executing right now
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the dependencies concurrently, then the action.
    ///
    /// Dependency failures cancel the shared child context. The first failure
    /// that is not a cancellation is returned, and a cancellation that came from
    /// this level is absorbed.
    pub(crate) fn run(
        self: Arc<Self>,
        ctx: Context,
        limiter: Option<Arc<Semaphore>>,
    ) -> BoxFuture<'static, RunResult<()>> {
        async move {
            let _lock = self.lock.lock().await;
            let _running = RunningFlag(&self.running);

            let ctx = ctx.enter(&self.name);
            ctx.debug("start");

            let gave_up = Arc::new(AtomicBool::new(false));
            let failure: Arc<Mutex<Option<RunError>>> = Arc::new(Mutex::new(None));

            let mut deps = JoinSet::new();
            for dep in self.deps.values() {
                if ctx.is_cancelled() {
                    continue;
                }
                let dep = Arc::clone(dep);
                let ctx = ctx.clone();
                let gave_up = Arc::clone(&gave_up);
                let failure = Arc::clone(&failure);
                let limiter = limiter.clone();
                deps.spawn(async move {
                    ctx.debug(format_args!("waiting for {}", dep.name));
                    let name = dep.name.clone();
                    if let Err(err) = dep.run(ctx.clone(), limiter).await {
                        give_up(&ctx, &gave_up, &name);
                        if !err.is_canceled() {
                            ctx.error(&err);
                            record(&failure, err);
                        }
                    }
                });
            }

            while let Some(joined) = deps.join_next().await {
                if let Err(err) = joined {
                    give_up(&ctx, &gave_up, "a dependency");
                    ctx.error(&err);
                    record(&failure, RunError::Panicked(self.name.clone()));
                }
            }

            let failure = failure.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(err) = failure {
                return Err(err);
            }
            if let Some(err) = ctx.err() {
                return absorb(err);
            }

            let (_permit, action_ctx) = match &limiter {
                Some(_) if ctx.holds_permit() => (None, ctx.clone()),
                Some(limiter) => tokio::select! {
                    permit = Arc::clone(limiter).acquire_owned() => (permit.ok(), ctx.with_permit()),
                    err = ctx.done() => return absorb(err),
                },
                None => (None, ctx.clone()),
            };

            self.running.store(true, Ordering::SeqCst);
            (self.action)(action_ctx)
                .await
                .map_err(|err| RunError::from_action(&self.name, err))?;
            ctx.debug("done");
            Ok(())
        }
        .boxed()
    }
}

impl fmt::Debug for RegisteredTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTask")
            .field("name", &self.name)
            .field("deps", &self.declared)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Resets the running flag when a run ends, however it ends
struct RunningFlag<'a>(&'a AtomicBool);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Warn once per dependency set and stop the remaining siblings
fn give_up(ctx: &Context, gave_up: &AtomicBool, name: &str) {
    if !gave_up.swap(true, Ordering::SeqCst) {
        ctx.warn(format_args!("{name} failed. Giving up!"));
    }
    ctx.cancel();
}

fn record(failure: &Mutex<Option<RunError>>, err: RunError) {
    let mut failure = failure.lock().unwrap_or_else(PoisonError::into_inner);
    if failure.is_none() {
        *failure = Some(err);
    }
}

fn absorb(err: ContextError) -> RunResult<()> {
    match err {
        ContextError::Canceled => Ok(()),
        err => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(name: &str, deps: Vec<Arc<RegisteredTask>>) -> Arc<RegisteredTask> {
        let task = Task::new(name, "test").deps(deps.iter().map(|d| d.name().to_string()));
        let deps = deps.into_iter().map(|d| (d.name().to_string(), d)).collect();
        Arc::new(RegisteredTask::new(task, noop(), deps))
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new("build", "Build the project")
            .description("Compiles everything")
            .deps(["fetch", "generate"])
            .with_action(noop());

        assert_eq!(task.name, "build");
        assert_eq!(task.usage, "Build the project");
        assert_eq!(task.description.as_deref(), Some("Compiles everything"));
        assert_eq!(task.deps, vec!["fetch", "generate"]);
        assert!(task.action.is_some());
    }

    #[test]
    fn test_task_debug_hides_action() {
        let task = Task::new("a", "b").with_action(noop());
        let debug = format!("{task:?}");
        assert!(debug.contains("<action>"));
    }

    #[test]
    fn test_absorb() {
        assert!(absorb(ContextError::Canceled).is_ok());
        assert!(absorb(ContextError::DeadlineExceeded).is_err());
    }

    #[tokio::test]
    async fn test_run_resets_running_flag() {
        let leaf = registered("leaf", vec![]);
        let root = registered("root", vec![Arc::clone(&leaf)]);

        Arc::clone(&root).run(Context::background(), None).await.unwrap();

        assert!(!root.is_running());
        assert!(!leaf.is_running());
    }

    #[tokio::test]
    async fn test_run_skips_dependencies_when_cancelled() {
        let leaf = registered("leaf", vec![]);
        let root = registered("root", vec![leaf]);

        let ctx = Context::background();
        ctx.cancel();

        let result = root.run(ctx, None).await;
        assert!(result.is_ok());
    }
}
