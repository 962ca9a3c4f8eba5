//! Repository port for task persistence, lookup and conditional writes.

use crate::task::domain::{CompanyId, Task, TaskAssignment, TaskId, TaskPatch, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Subset of tasks a listing query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Every task of every company.
    All,
    /// Every task of one company.
    Company(CompanyId),
    /// Tasks visible to a driver: their own plus their company's marketplace.
    Driver {
        /// Viewing driver.
        driver: UserId,
        /// Driver's company.
        company: CompanyId,
    },
}

/// Task persistence contract.
///
/// Lifecycle transitions are written through [`TaskRepository::transition_if`],
/// which must behave as a single atomic compare-and-swap: of several writers
/// racing from the same expected assignment, at most one succeeds. Every
/// write bumps the stored revision, so a transition computed from a stale
/// read never overwrites a newer change.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Replaces the stored task with `task` only if the stored status,
    /// assignee and revision still equal `expected`.
    ///
    /// Returns `false` without writing when the condition does not hold or
    /// the task no longer exists.
    async fn transition_if(
        &self,
        expected: &TaskAssignment,
        task: &Task,
    ) -> TaskRepositoryResult<bool>;

    /// Writes the fields `patch` sets onto the stored task, stamps
    /// `updated_at` and bumps the revision. Other fields keep their stored
    /// values.
    ///
    /// Returns the task as stored after the write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(
        &self,
        task_id: TaskId,
        patch: &TaskPatch,
        updated_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task>;

    /// Lists the tasks in `scope`, oldest first.
    async fn list(&self, scope: TaskScope) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
