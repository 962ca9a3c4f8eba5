//! Service layer for task creation, listing and lifecycle transitions.

use crate::task::{
    domain::{
        Actor, Amount, CompanyId, Rating, RatingAdjustment, RatingChange,
        RatingPolicy, Task, TaskDomainError, TaskDraft, TaskId, TaskPatch, TransitionKind, UserId,
        filter_visible, is_visible_to,
    },
    ports::{
        DriverRatingStore, Notification, NotificationKind, Notifier, RatingStoreError,
        TaskRepository, TaskRepositoryError, TaskScope,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    company_id: CompanyId,
    title: String,
    price: Amount,
    scheduled_date: DateTime<Utc>,
    description: Option<String>,
    offered_to: Option<UserId>,
}

impl CreateTaskRequest {
    /// Creates a request with required task fields.
    #[must_use]
    pub fn new(
        company_id: CompanyId,
        title: impl Into<String>,
        price: Amount,
        scheduled_date: DateTime<Utc>,
    ) -> Self {
        Self {
            company_id,
            title: title.into(),
            price,
            scheduled_date,
            description: None,
            offered_to: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Offers the task directly to a driver instead of the marketplace.
    #[must_use]
    pub const fn offered_to(mut self, driver: UserId) -> Self {
        self.offered_to = Some(driver);
        self
    }
}

/// Result of a successful lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    /// Task as committed.
    pub task: Task,
    /// Rating adjustment applied alongside the transition, if any.
    pub rating_change: Option<RatingChange>,
}

/// Coarse error category for mapping onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The task does not exist or is hidden from the actor.
    NotFound,
    /// The actor may not perform the operation.
    Forbidden,
    /// The task's status does not permit the operation.
    InvalidState,
    /// Another driver holds the task or won a concurrent write.
    Conflict,
    /// The request payload is malformed.
    Validation,
    /// A storage backend failed.
    Persistence,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// A lifecycle guard or domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The task does not exist or is hidden from the actor.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// Task repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Rating store operation failed.
    #[error(transparent)]
    RatingStore(#[from] RatingStoreError),
    /// The transition committed but the driver's rating write failed.
    ///
    /// The task is already in its new state; only the rating adjustment is
    /// missing and may be replayed from `adjustment`.
    #[error("task {} committed but driver rating was not adjusted: {source}", task.id())]
    RatingNotApplied {
        /// Task as committed.
        task: Box<Task>,
        /// Adjustment that could not be stored.
        adjustment: RatingAdjustment,
        /// Rating store failure.
        source: RatingStoreError,
    },
}

impl TaskLifecycleError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => match err {
                TaskDomainError::Forbidden { .. } => ErrorKind::Forbidden,
                TaskDomainError::InvalidState { .. } | TaskDomainError::Unassigned(_) => {
                    ErrorKind::InvalidState
                }
                TaskDomainError::AssignedElsewhere { .. }
                | TaskDomainError::NotClaimable { .. }
                | TaskDomainError::ConcurrentModification(_) => ErrorKind::Conflict,
                TaskDomainError::EmptyTitle
                | TaskDomainError::TitleTooLong { .. }
                | TaskDomainError::EmptyUpdate
                | TaskDomainError::RatingOutOfRange(_)
                | TaskDomainError::InvalidRatingBounds { .. } => ErrorKind::Validation,
            },
            Self::NotFound(_) | Self::Repository(TaskRepositoryError::NotFound(_)) => {
                ErrorKind::NotFound
            }
            Self::Repository(TaskRepositoryError::DuplicateTask(_)) => ErrorKind::Conflict,
            Self::Repository(TaskRepositoryError::Persistence(_))
            | Self::RatingStore(_)
            | Self::RatingNotApplied { .. } => ErrorKind::Persistence,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Each transition loads the task, runs the domain guard on a copy and
/// commits it with a conditional write keyed on the revision it read. Rating adjustments follow the committed write; notifications go
/// out last and never fail the transition.
#[derive(Clone)]
pub struct TaskLifecycleService<R, S, N, C>
where
    R: TaskRepository,
    S: DriverRatingStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    ratings: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<C>,
    policy: RatingPolicy,
}

impl<R, S, N, C> TaskLifecycleService<R, S, N, C>
where
    R: TaskRepository,
    S: DriverRatingStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service with the default rating policy.
    #[must_use]
    pub fn new(repository: Arc<R>, ratings: Arc<S>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            repository,
            ratings,
            notifier,
            clock,
            policy: RatingPolicy::default(),
        }
    }

    /// Replaces the rating policy.
    #[must_use]
    pub fn with_rating_policy(mut self, policy: RatingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the rating policy in effect.
    #[must_use]
    pub const fn rating_policy(&self) -> &RatingPolicy {
        &self.policy
    }

    /// Creates a pending task on behalf of an administrator.
    ///
    /// Directed offers notify the driver they are offered to.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the title is blank or too
    /// long or the actor does not administer the target company, and
    /// [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        let CreateTaskRequest {
            company_id,
            title,
            price,
            scheduled_date,
            description,
            offered_to,
        } = request;

        let draft = TaskDraft {
            company_id,
            created_by: actor.id(),
            title,
            description,
            price,
            scheduled_date,
            offered_to,
        };
        let task = Task::new(draft, &*self.clock)?;
        if !actor.administers(company_id) {
            return Err(TaskDomainError::Forbidden {
                task_id: task.id(),
                actor: actor.id(),
                transition: TransitionKind::Create,
            }
            .into());
        }

        self.repository.store(&task).await?;
        if let Some(driver) = offered_to {
            self.notify(driver, NotificationKind::TaskOffered, &task, None)
                .await;
        }
        Ok(task)
    }

    /// Retrieves a task the actor may see.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist
    /// or is hidden from the actor.
    pub async fn get(&self, actor: &Actor, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let task = self.load(task_id).await?;
        let visible = if actor.is_driver() {
            is_visible_to(actor, &task)
        } else {
            actor.administers(task.company_id())
        };
        if !visible {
            return Err(TaskLifecycleError::NotFound(task_id));
        }
        Ok(task)
    }

    /// Lists the tasks visible to the actor, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn list(&self, actor: &Actor) -> TaskLifecycleResult<Vec<Task>> {
        let tasks = self.repository.list(scope_for(actor)).await?;
        Ok(filter_visible(actor, tasks))
    }

    /// Returns a driver's rating, or the policy baseline if never rated.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::RatingStore`] when the lookup fails.
    pub async fn driver_rating(&self, driver: UserId) -> TaskLifecycleResult<Rating> {
        let rating = self.ratings.rating(driver).await?;
        Ok(rating.unwrap_or(self.policy.baseline()))
    }

    /// Claims a pending task for the acting driver.
    ///
    /// Of several drivers racing for the same task at most one succeeds; the
    /// others receive a conflict or invalid-state error and change nothing.
    /// Drivers of another company always get a conflict, whether or not the
    /// task has been claimed yet.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks and
    /// [`TaskLifecycleError::Domain`] when the accept guard fails or the
    /// claim is lost to a concurrent writer.
    pub async fn accept(
        &self,
        actor: &Actor,
        task_id: TaskId,
    ) -> TaskLifecycleResult<TransitionOutcome> {
        let (task, adjustment) = self
            .transition(actor, task_id, |task, actor, clock| {
                task.accept(actor, clock).map(|()| None)
            })
            .await?;
        self.finish(task, adjustment, NotificationKind::TaskAccepted)
            .await
    }

    /// Returns an offered or accepted task to the marketplace.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks and
    /// [`TaskLifecycleError::Domain`] when the reject guard fails.
    pub async fn reject(
        &self,
        actor: &Actor,
        task_id: TaskId,
    ) -> TaskLifecycleResult<TransitionOutcome> {
        let (task, adjustment) = self
            .transition(actor, task_id, |task, actor, clock| task.reject(actor, clock))
            .await?;
        self.finish(task, adjustment, NotificationKind::TaskRejected)
            .await
    }

    /// Backs the acting driver out of an accepted task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks and
    /// [`TaskLifecycleError::Domain`] when the cancel guard fails.
    pub async fn cancel(
        &self,
        actor: &Actor,
        task_id: TaskId,
    ) -> TaskLifecycleResult<TransitionOutcome> {
        let (task, adjustment) = self
            .transition(actor, task_id, |task, actor, clock| task.cancel(actor, clock))
            .await?;
        self.finish(task, adjustment, NotificationKind::TaskCancelled)
            .await
    }

    /// Completes a task and adjusts the assigned driver's rating by
    /// timeliness.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks,
    /// [`TaskLifecycleError::Domain`] when the complete guard fails and
    /// [`TaskLifecycleError::RatingNotApplied`] when the rating write fails
    /// after the task was committed.
    pub async fn complete(
        &self,
        actor: &Actor,
        task_id: TaskId,
    ) -> TaskLifecycleResult<TransitionOutcome> {
        let (task, adjustment) = self
            .transition(actor, task_id, |task, actor, clock| {
                task.complete(actor, clock).map(Some)
            })
            .await?;
        self.finish(task, adjustment, NotificationKind::TaskCompleted)
            .await
    }

    /// Applies an administrative patch outside the guarded lifecycle.
    ///
    /// Status and assignment may be overwritten freely; no rating adjustment
    /// happens. Only the patched fields are written, and the returned task is
    /// the stored row after the write. Assigning a new driver notifies them
    /// of the offer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks and
    /// [`TaskLifecycleError::Domain`] when the actor does not administer the
    /// task or the patch is invalid.
    pub async fn update(
        &self,
        actor: &Actor,
        task_id: TaskId,
        patch: TaskPatch,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.load(task_id).await?;
        let previous_assignee = task.assigned_to();

        let validated = task.apply_patch(actor, patch, &*self.clock)?;
        let stored = self
            .repository
            .update(task_id, &validated, task.updated_at())
            .await?;

        let offered = validated
            .new_assignee()
            .filter(|driver| Some(*driver) != previous_assignee);
        if let Some(driver) = offered {
            self.notify(driver, NotificationKind::TaskOffered, &stored, None)
                .await;
        }
        Ok(stored)
    }

    async fn load(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    /// Runs a guarded transition and commits it with a conditional write.
    async fn transition<F>(
        &self,
        actor: &Actor,
        task_id: TaskId,
        apply: F,
    ) -> TaskLifecycleResult<(Task, Option<RatingAdjustment>)>
    where
        F: Fn(&mut Task, &Actor, &C) -> Result<Option<RatingAdjustment>, TaskDomainError>
            + Send
            + Sync,
    {
        let mut task = self.load(task_id).await?;
        let expected = task.assignment();
        let adjustment = apply(&mut task, actor, &*self.clock)?;

        if self.repository.transition_if(&expected, &task).await? {
            return Ok((task, adjustment));
        }

        tracing::debug!(task_id = %task_id, actor = %actor.id(), "conditional task write lost");
        Err(self.explain_lost_write(actor, task_id, &apply).await)
    }

    /// Re-reads a task after a lost conditional write and reports why the
    /// transition no longer applies.
    async fn explain_lost_write<F>(
        &self,
        actor: &Actor,
        task_id: TaskId,
        apply: &F,
    ) -> TaskLifecycleError
    where
        F: Fn(&mut Task, &Actor, &C) -> Result<Option<RatingAdjustment>, TaskDomainError>
            + Send
            + Sync,
    {
        match self.repository.find_by_id(task_id).await {
            Ok(Some(mut fresh)) => match apply(&mut fresh, actor, &*self.clock) {
                Err(err) => err.into(),
                Ok(_) => TaskDomainError::ConcurrentModification(task_id).into(),
            },
            Ok(None) => TaskLifecycleError::NotFound(task_id),
            Err(err) => err.into(),
        }
    }

    /// Applies the rating adjustment of a committed transition and notifies
    /// the creator.
    ///
    /// The creator hears about the transition even when the rating write
    /// fails, since the task change itself is already durable.
    async fn finish(
        &self,
        task: Task,
        adjustment: Option<RatingAdjustment>,
        kind: NotificationKind,
    ) -> TaskLifecycleResult<TransitionOutcome> {
        let Some(pending) = adjustment else {
            self.notify(task.created_by(), kind, &task, None).await;
            return Ok(TransitionOutcome {
                task,
                rating_change: None,
            });
        };

        match self.adjust_rating(pending).await {
            Ok(change) => {
                self.notify(task.created_by(), kind, &task, Some(&change))
                    .await;
                Ok(TransitionOutcome {
                    task,
                    rating_change: Some(change),
                })
            }
            Err(source) => {
                tracing::error!(
                    task_id = %task.id(),
                    driver = %pending.driver,
                    event = ?pending.event,
                    error = %source,
                    "rating adjustment failed after committed transition"
                );
                self.notify(task.created_by(), kind, &task, None).await;
                Err(TaskLifecycleError::RatingNotApplied {
                    task: Box::new(task),
                    adjustment: pending,
                    source,
                })
            }
        }
    }

    async fn adjust_rating(
        &self,
        pending: RatingAdjustment,
    ) -> Result<RatingChange, RatingStoreError> {
        let delta = self.policy.delta(pending.event);
        let rating = self
            .ratings
            .adjust_rating(pending.driver, delta, &self.policy)
            .await?;
        Ok(RatingChange {
            driver: pending.driver,
            event: pending.event,
            delta,
            rating,
        })
    }

    /// Delivers a notification, logging and swallowing any failure.
    async fn notify(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        task: &Task,
        rating_change: Option<&RatingChange>,
    ) {
        let notification = Notification {
            recipient,
            kind,
            task_id: task.id(),
            payload: json!({
                "title": task.title(),
                "status": task.status(),
                "assigned_to": task.assigned_to(),
                "rating_change": rating_change.map(|change| json!({
                    "driver": change.driver,
                    "delta": change.delta.to_string(),
                    "rating": change.rating.to_string(),
                    "reason": change.reason(),
                })),
            }),
        };
        if let Err(err) = self.notifier.notify(notification).await {
            tracing::warn!(
                task_id = %task.id(),
                recipient = %recipient,
                kind = ?kind,
                error = %err,
                "task notification failed"
            );
        }
    }
}

/// Maps an actor onto the listing scope; only super administrators carry no
/// company.
fn scope_for(actor: &Actor) -> TaskScope {
    match actor.company() {
        None => TaskScope::All,
        Some(company) if actor.is_driver() => TaskScope::Driver {
            driver: actor.id(),
            company,
        },
        Some(company) => TaskScope::Company(company),
    }
}
