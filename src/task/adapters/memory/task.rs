//! In-memory task repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Actor, Task, TaskAssignment, TaskId, TaskPatch, is_visible_to},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskScope},
};

/// Thread-safe in-memory task repository.
///
/// Conditional transitions are evaluated and written under one write lock,
/// which gives [`TaskRepository::transition_if`] its compare-and-swap
/// semantics.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn in_scope(scope: TaskScope, task: &Task) -> bool {
    match scope {
        TaskScope::All => true,
        TaskScope::Company(company) => task.company_id() == company,
        TaskScope::Driver { driver, company } => {
            is_visible_to(&Actor::driver(driver, company), task)
        }
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        if tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks.get(&id).cloned())
    }

    async fn transition_if(
        &self,
        expected: &TaskAssignment,
        task: &Task,
    ) -> TaskRepositoryResult<bool> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        match tasks.get_mut(&task.id()) {
            Some(stored) if stored.assignment() == *expected => {
                *stored = task.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update(
        &self,
        task_id: TaskId,
        patch: &TaskPatch,
        updated_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let stored = tasks
            .get_mut(&task_id)
            .ok_or(TaskRepositoryError::NotFound(task_id))?;
        stored.merge_patch(patch, updated_at);
        Ok(stored.clone())
    }

    async fn list(&self, scope: TaskScope) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        let mut listed: Vec<Task> = tasks
            .values()
            .filter(|task| in_scope(scope, task))
            .cloned()
            .collect();
        listed.sort_by(|left, right| {
            left.created_at()
                .cmp(&right.created_at())
                .then_with(|| left.id().into_inner().cmp(&right.id().into_inner()))
        });
        Ok(listed)
    }
}
