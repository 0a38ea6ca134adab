//! Task registry
//!
//! Validates task definitions, resolves their dependency names into direct
//! references and serves name lookups for the runner.

use crate::error::{RegistryError, RegistryResult};
use crate::runner::{RegisteredTask, Task};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

type TaskMap = HashMap<String, Arc<RegisteredTask>>;

/// The set of registered tasks, keyed by name
#[derive(Debug, Default)]
pub struct Registry {
    tasks: RwLock<TaskMap>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register tasks, in order.
    ///
    /// Stops at the first invalid definition. Tasks registered before it stay
    /// registered.
    pub fn add<I>(&self, tasks: I) -> RegistryResult<()>
    where
        I: IntoIterator<Item = Task>,
    {
        let mut registered = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        for (index, task) in tasks.into_iter().enumerate() {
            let task = resolve(&registered, index, task)?;
            registered.insert(task.name().to_string(), Arc::new(task));
        }
        Ok(())
    }

    /// Look up a registered task by name
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredTask>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Name and usage of every task, sorted by name
    pub fn summaries(&self) -> Vec<(String, String)> {
        let mut summaries: Vec<_> = self
            .read()
            .values()
            .map(|t| (t.name().to_string(), t.usage().to_string()))
            .collect();
        summaries.sort();
        summaries
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, TaskMap> {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Validate a single definition against the tasks registered so far
fn resolve(tasks: &TaskMap, index: usize, mut task: Task) -> RegistryResult<RegisteredTask> {
    if task.name.is_empty() {
        return Err(RegistryError::MissingName { index });
    }

    let action = task
        .action
        .take()
        .ok_or_else(|| RegistryError::MissingAction(task.name.clone()))?;

    if task.usage.is_empty() {
        return Err(RegistryError::MissingUsage(task.name.clone()));
    }

    if tasks.contains_key(&task.name) {
        // Dependencies must already be registered, so redefining an existing
        // task is the only way a definition can close a cycle.
        for dep in &task.deps {
            if let Some(path) = tasks.get(dep).and_then(|d| path_to(d, &task.name)) {
                return Err(RegistryError::CircularDependency(format!(
                    "{} -> {}",
                    task.name,
                    path.join(" -> ")
                )));
            }
        }
        return Err(RegistryError::DuplicateTask(task.name.clone()));
    }

    let mut deps = HashMap::new();
    for dep in &task.deps {
        if *dep == task.name {
            return Err(RegistryError::CircularDependency(format!("{0} -> {0}", task.name)));
        }
        let resolved = tasks
            .get(dep)
            .ok_or_else(|| RegistryError::UnknownDependency {
                dependency: dep.clone(),
                task: task.name.clone(),
            })?;
        deps.insert(dep.clone(), Arc::clone(resolved));
    }

    Ok(RegisteredTask::new(task, action, deps))
}

/// Dependency path from `from` down to the task named `target`, if any
fn path_to(from: &RegisteredTask, target: &str) -> Option<Vec<String>> {
    let mut visited = HashSet::new();
    let mut stack = Vec::new();
    if walk(from, target, &mut visited, &mut stack) {
        Some(stack)
    } else {
        None
    }
}

fn walk<'a>(
    task: &'a RegisteredTask,
    target: &str,
    visited: &mut HashSet<&'a str>,
    stack: &mut Vec<String>,
) -> bool {
    stack.push(task.name().to_string());

    if task.name() == target {
        return true;
    }

    if visited.insert(task.name()) {
        for dep in task.deps.values() {
            if walk(dep, target, visited, stack) {
                return true;
            }
        }
    }

    stack.pop();
    false
}
