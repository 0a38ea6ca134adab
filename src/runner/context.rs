//! Execution context for task running
//!
//! A context carries a cancellation signal and the execution frame (current and
//! parent task names) down the dependency recursion, and logs through `tracing`
//! with the frame attached.

use crate::error::ContextError;
use std::fmt::Display;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::Notify;

/// Name of the task that does not record itself in the execution frame
pub const DEFAULT_TASK: &str = "default";

/// Ancestry of the task currently executing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    task: Option<String>,
    parent: Option<String>,
}

impl Frame {
    /// Name of the task this frame belongs to
    pub fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }

    /// Name of the task that required the current one
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Frame for a task entered from this one
    pub fn enter(&self, name: &str) -> Frame {
        let parent = self.task.clone().or_else(|| self.parent.clone());
        let task = if name == DEFAULT_TASK {
            self.task.clone()
        } else {
            Some(name.to_string())
        };
        Frame { task, parent }
    }
}

/// Cancellation state shared by a context and its clones
#[derive(Debug, Default)]
struct Signal {
    reason: OnceLock<ContextError>,
    notify: Notify,
    children: Mutex<Vec<Weak<Signal>>>,
}

impl Signal {
    fn child(self: &Arc<Self>) -> Arc<Signal> {
        let child = Arc::new(Signal::default());
        let mut children = self.children.lock().unwrap_or_else(PoisonError::into_inner);
        // The reason is set before `cancel` takes this lock, so checking under it
        // cannot miss a concurrent cancellation.
        match self.reason.get() {
            Some(reason) => {
                drop(children);
                child.cancel(*reason);
            }
            None => {
                children.retain(|c| c.strong_count() > 0);
                children.push(Arc::downgrade(&child));
            }
        }
        child
    }

    fn cancel(&self, reason: ContextError) {
        if self.reason.set(reason).is_err() {
            return;
        }
        self.notify.notify_waiters();
        let children = std::mem::take(
            &mut *self.children.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel(reason);
        }
    }

    fn err(&self) -> Option<ContextError> {
        self.reason.get().copied()
    }

    async fn cancelled(&self) {
        loop {
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();
            if self.reason.get().is_some() {
                return;
            }
            notified.await;
        }
    }
}

/// Execution context passed to every task action
#[derive(Debug, Clone, Default)]
pub struct Context {
    signal: Arc<Signal>,
    frame: Frame,
    // Set inside an action that already holds a concurrency permit
    holds_permit: bool,
}

impl Context {
    /// A context that is never cancelled unless `cancel` is called on it
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that can be cancelled without affecting this one
    pub fn with_cancel(&self) -> Self {
        Context {
            signal: self.signal.child(),
            frame: self.frame.clone(),
            holds_permit: self.holds_permit,
        }
    }

    /// Derive a context cancelled with `DeadlineExceeded` after `timeout`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let ctx = self.with_cancel();
        let signal = Arc::downgrade(&ctx.signal);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(signal) = signal.upgrade() {
                signal.cancel(ContextError::DeadlineExceeded);
            }
        });
        ctx
    }

    /// Derive the context for running task `name`
    pub(crate) fn enter(&self, name: &str) -> Self {
        Context {
            signal: self.signal.child(),
            frame: self.frame.enter(name),
            holds_permit: self.holds_permit,
        }
    }

    /// Same context, marked as running under a concurrency permit.
    ///
    /// Tasks run from it, for instance through `Build::run_for`, do not wait
    /// for another permit.
    pub(crate) fn with_permit(&self) -> Self {
        Context {
            holds_permit: true,
            ..self.clone()
        }
    }

    pub(crate) fn holds_permit(&self) -> bool {
        self.holds_permit
    }

    /// Cancel this context and every context derived from it
    pub fn cancel(&self) {
        self.signal.cancel(ContextError::Canceled);
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.err().is_some()
    }

    /// Terminal error, once the context is cancelled
    pub fn err(&self) -> Option<ContextError> {
        self.signal.err()
    }

    /// Wait until the context is cancelled
    pub async fn cancelled(&self) {
        self.signal.cancelled().await
    }

    /// Wait until the context is cancelled and return its terminal error
    pub async fn done(&self) -> ContextError {
        self.cancelled().await;
        self.err().unwrap_or(ContextError::Canceled)
    }

    /// Execution frame of the current task
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn debug(&self, message: impl Display) {
        tracing::debug!(task = self.frame.task(), parent = self.frame.parent(), "{}", message);
    }

    pub fn info(&self, message: impl Display) {
        tracing::info!(task = self.frame.task(), parent = self.frame.parent(), "{}", message);
    }

    pub fn warn(&self, message: impl Display) {
        tracing::warn!(task = self.frame.task(), parent = self.frame.parent(), "{}", message);
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!(task = self.frame.task(), parent = self.frame.parent(), "{}", message);
    }
}
