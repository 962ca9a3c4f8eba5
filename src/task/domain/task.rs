//! Task aggregate root and the guarded lifecycle transitions.

use super::{
    Actor, Amount, CompanyId, ParseTaskStatusError, RatingAdjustment, RatingEvent,
    TaskDomainError, TaskId, UserId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
///
/// Rejection and cancellation are transitions back to [`TaskStatus::Pending`]
/// and never resting states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Waiting in the marketplace or offered to a specific driver.
    Pending,
    /// Claimed by the assigned driver.
    Accepted,
    /// Finished; no further transitions.
    Completed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Returns `true` when no lifecycle transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation requested on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Create a task.
    Create,
    /// Claim a pending task.
    Accept,
    /// Decline an offered or accepted task.
    Reject,
    /// Back out of an accepted task.
    Cancel,
    /// Finish a task.
    Complete,
    /// Administrative field patch.
    Update,
}

impl TransitionKind {
    /// Returns the verb used in messages and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare-and-swap key for lifecycle writes.
///
/// Every stored change bumps the revision, so a conditional write keyed on
/// it fails when anything about the task changed since it was read, not
/// only its status or assignee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskAssignment {
    /// Expected lifecycle status.
    pub status: TaskStatus,
    /// Expected assignee.
    pub assigned_to: Option<UserId>,
    /// Expected revision.
    pub revision: u64,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    company_id: CompanyId,
    created_by: UserId,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    assigned_to: Option<UserId>,
    scheduled_date: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    price: Amount,
    actual_earnings: Option<Amount>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

/// Parameter object for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Owning company.
    pub company_id: CompanyId,
    /// Creating administrator.
    pub created_by: UserId,
    /// Task title.
    pub title: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Agreed price.
    pub price: Amount,
    /// Day the task is due.
    pub scheduled_date: DateTime<Utc>,
    /// Driver the task is offered to, if it skips the marketplace.
    pub offered_to: Option<UserId>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning company.
    pub company_id: CompanyId,
    /// Persisted creator.
    pub created_by: UserId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted assignee.
    pub assigned_to: Option<UserId>,
    /// Persisted schedule.
    pub scheduled_date: DateTime<Utc>,
    /// Persisted completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted price.
    pub price: Amount,
    /// Persisted earnings.
    pub actual_earnings: Option<Amount>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest change timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted revision counter.
    pub revision: u64,
}

/// Administrative field patch applied without lifecycle guards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    title: Option<String>,
    description: Option<Option<String>>,
    price: Option<Amount>,
    actual_earnings: Option<Option<Amount>>,
    scheduled_date: Option<DateTime<Utc>>,
    status: Option<TaskStatus>,
    assigned_to: Option<Option<UserId>>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces or clears the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Replaces the price.
    #[must_use]
    pub const fn with_price(mut self, price: Amount) -> Self {
        self.price = Some(price);
        self
    }

    /// Replaces or clears the recorded earnings.
    #[must_use]
    pub const fn with_actual_earnings(mut self, earnings: Option<Amount>) -> Self {
        self.actual_earnings = Some(earnings);
        self
    }

    /// Moves the scheduled date.
    #[must_use]
    pub const fn with_scheduled_date(mut self, scheduled_date: DateTime<Utc>) -> Self {
        self.scheduled_date = Some(scheduled_date);
        self
    }

    /// Overwrites the status directly.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Assigns the task to a driver, or clears the assignment with `None`.
    #[must_use]
    pub const fn with_assignee(mut self, driver: Option<UserId>) -> Self {
        self.assigned_to = Some(driver);
        self
    }

    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Returns the new assignee when the patch sets one.
    #[must_use]
    pub fn new_assignee(&self) -> Option<UserId> {
        self.assigned_to.flatten()
    }

    /// Returns the replacement title, if set.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the description change, if set; `Some(None)` clears it.
    #[must_use]
    pub fn description(&self) -> Option<Option<&str>> {
        self.description.as_ref().map(Option::as_deref)
    }

    /// Returns the replacement price, if set.
    #[must_use]
    pub const fn price(&self) -> Option<Amount> {
        self.price
    }

    /// Returns the earnings change, if set; `Some(None)` clears them.
    #[must_use]
    pub const fn actual_earnings(&self) -> Option<Option<Amount>> {
        self.actual_earnings
    }

    /// Returns the replacement scheduled date, if set.
    #[must_use]
    pub const fn scheduled_date(&self) -> Option<DateTime<Utc>> {
        self.scheduled_date
    }

    /// Returns the status overwrite, if set.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the assignment change, if set; `Some(None)` unassigns.
    #[must_use]
    pub const fn assignee(&self) -> Option<Option<UserId>> {
        self.assigned_to
    }

    fn validated(mut self) -> Result<Self, TaskDomainError> {
        if self.is_empty() {
            return Err(TaskDomainError::EmptyUpdate);
        }
        self.title = self.title.map(normalize_title).transpose()?;
        Ok(self)
    }
}

impl Task {
    /// Longest title accepted, in characters.
    pub const MAX_TITLE_LENGTH: usize = 255;

    /// Creates a pending task, optionally offered to a specific driver.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank and
    /// [`TaskDomainError::TitleTooLong`] when it exceeds
    /// [`Task::MAX_TITLE_LENGTH`] characters.
    pub fn new(draft: TaskDraft, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = normalize_title(draft.title)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            company_id: draft.company_id,
            created_by: draft.created_by,
            title,
            description: draft.description,
            status: TaskStatus::Pending,
            assigned_to: draft.offered_to,
            scheduled_date: draft.scheduled_date,
            completed_at: None,
            price: draft.price,
            actual_earnings: None,
            created_at: timestamp,
            updated_at: timestamp,
            revision: 0,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            company_id: data.company_id,
            created_by: data.created_by,
            title: data.title,
            description: data.description,
            status: data.status,
            assigned_to: data.assigned_to,
            scheduled_date: data.scheduled_date,
            completed_at: data.completed_at,
            price: data.price,
            actual_earnings: data.actual_earnings,
            created_at: data.created_at,
            updated_at: data.updated_at,
            revision: data.revision,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning company.
    #[must_use]
    pub const fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the creating user.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the assigned driver, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    /// Returns the scheduled date.
    #[must_use]
    pub const fn scheduled_date(&self) -> DateTime<Utc> {
        self.scheduled_date
    }

    /// Returns the completion timestamp, if completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the agreed price.
    #[must_use]
    pub const fn price(&self) -> Amount {
        self.price
    }

    /// Returns the recorded earnings, if any.
    #[must_use]
    pub const fn actual_earnings(&self) -> Option<Amount> {
        self.actual_earnings
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the revision, bumped by every change.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the key guarding conditional writes of this task.
    #[must_use]
    pub const fn assignment(&self) -> TaskAssignment {
        TaskAssignment {
            status: self.status,
            assigned_to: self.assigned_to,
            revision: self.revision,
        }
    }

    /// Returns `true` when the task sits unassigned in the marketplace.
    #[must_use]
    pub const fn is_in_marketplace(&self) -> bool {
        matches!(self.status, TaskStatus::Pending) && self.assigned_to.is_none()
    }

    /// Claims the task for the acting driver.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AssignedElsewhere`] when another driver
    /// holds the task, [`TaskDomainError::InvalidState`] when it is not
    /// pending, [`TaskDomainError::NotClaimable`] when it sits in another
    /// company's marketplace and [`TaskDomainError::Forbidden`] when the
    /// actor is not a driver.
    pub fn accept(&mut self, actor: &Actor, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_driver(actor, TransitionKind::Accept)?;
        if let Some(assignee) = self.assigned_to.filter(|driver| *driver != actor.id()) {
            return Err(TaskDomainError::AssignedElsewhere {
                task_id: self.id,
                assigned_to: assignee,
            });
        }
        self.ensure_status(TaskStatus::Pending, TransitionKind::Accept)?;
        if self.assigned_to.is_none() && !actor.belongs_to(self.company_id) {
            return Err(TaskDomainError::NotClaimable {
                task_id: self.id,
                driver: actor.id(),
            });
        }

        self.status = TaskStatus::Accepted;
        self.assigned_to = Some(actor.id());
        self.touch(clock);
        Ok(())
    }

    /// Declines an offered task or drops an accepted one.
    ///
    /// Only dropping an accepted task carries a rating penalty.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] when the task is completed
    /// and [`TaskDomainError::Forbidden`] when the actor is not a driver
    /// entitled to decline it.
    pub fn reject(
        &mut self,
        actor: &Actor,
        clock: &impl Clock,
    ) -> Result<Option<RatingAdjustment>, TaskDomainError> {
        self.ensure_driver(actor, TransitionKind::Reject)?;
        let penalty = match self.status {
            TaskStatus::Completed => {
                return Err(self.invalid_state(TransitionKind::Reject));
            }
            TaskStatus::Pending => {
                let entitled = match self.assigned_to {
                    Some(driver) => driver == actor.id(),
                    None => actor.belongs_to(self.company_id),
                };
                if !entitled {
                    return Err(self.forbidden(actor, TransitionKind::Reject));
                }
                None
            }
            TaskStatus::Accepted => {
                self.ensure_assigned_to(actor, TransitionKind::Reject)?;
                Some(RatingEvent::RejectedAfterAcceptance)
            }
        };

        Ok(self.return_to_marketplace(actor, penalty, clock))
    }

    /// Backs the acting driver out of an accepted task.
    ///
    /// Always carries the cancellation penalty.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] when the task is not
    /// accepted and [`TaskDomainError::Forbidden`] when the actor is not its
    /// driver.
    pub fn cancel(
        &mut self,
        actor: &Actor,
        clock: &impl Clock,
    ) -> Result<Option<RatingAdjustment>, TaskDomainError> {
        self.ensure_driver(actor, TransitionKind::Cancel)?;
        self.ensure_status(TaskStatus::Accepted, TransitionKind::Cancel)?;
        self.ensure_assigned_to(actor, TransitionKind::Cancel)?;

        Ok(self.return_to_marketplace(
            actor,
            Some(RatingEvent::CancelledAfterAcceptance),
            clock,
        ))
    }

    /// Marks the task completed and classifies its timeliness.
    ///
    /// Drivers may complete only their own tasks; administrators may
    /// complete any task in their company scope.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Forbidden`] when the actor lacks authority,
    /// [`TaskDomainError::InvalidState`] when already completed and
    /// [`TaskDomainError::Unassigned`] when no driver holds the task.
    pub fn complete(
        &mut self,
        actor: &Actor,
        clock: &impl Clock,
    ) -> Result<RatingAdjustment, TaskDomainError> {
        if actor.is_driver() {
            self.ensure_assigned_to(actor, TransitionKind::Complete)?;
        } else if !actor.administers(self.company_id) {
            return Err(self.forbidden(actor, TransitionKind::Complete));
        }
        if self.status.is_terminal() {
            return Err(self.invalid_state(TransitionKind::Complete));
        }
        let driver = self
            .assigned_to
            .ok_or(TaskDomainError::Unassigned(self.id))?;

        self.touch(clock);
        self.status = TaskStatus::Completed;
        self.completed_at = Some(self.updated_at);
        self.actual_earnings = Some(self.actual_earnings.unwrap_or(self.price));

        Ok(RatingAdjustment {
            driver,
            event: RatingEvent::for_completion(self.updated_at, self.scheduled_date),
        })
    }

    /// Applies an administrative patch without lifecycle guards.
    ///
    /// Status and assignment are overwritten verbatim; no rating adjustment
    /// or completion bookkeeping happens here. Returns the patch with its
    /// title normalized, ready to persist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Forbidden`] when the actor does not
    /// administer the task's company, [`TaskDomainError::EmptyUpdate`] for an
    /// empty patch, and [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::TitleTooLong`] for an unusable title.
    pub fn apply_patch(
        &mut self,
        actor: &Actor,
        patch: TaskPatch,
        clock: &impl Clock,
    ) -> Result<TaskPatch, TaskDomainError> {
        if !actor.administers(self.company_id) {
            return Err(self.forbidden(actor, TransitionKind::Update));
        }
        let validated = patch.validated()?;
        self.merge_patch(&validated, clock.utc());
        Ok(validated)
    }

    /// Overwrites the fields a validated patch sets and bumps the revision.
    ///
    /// Storage adapters replay patches with this so that fields the patch
    /// leaves alone keep their stored values.
    pub fn merge_patch(&mut self, patch: &TaskPatch, updated_at: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(earnings) = patch.actual_earnings {
            self.actual_earnings = earnings;
        }
        if let Some(scheduled_date) = patch.scheduled_date {
            self.scheduled_date = scheduled_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assignee) = patch.assigned_to {
            self.assigned_to = assignee;
        }
        self.updated_at = updated_at;
        self.revision = self.revision.saturating_add(1);
    }

    /// Puts the task back into the marketplace and reports the penalty owed
    /// by the driver losing it, if any.
    fn return_to_marketplace(
        &mut self,
        actor: &Actor,
        penalty: Option<RatingEvent>,
        clock: &impl Clock,
    ) -> Option<RatingAdjustment> {
        self.status = TaskStatus::Pending;
        self.assigned_to = None;
        self.touch(clock);
        penalty.map(|event| RatingAdjustment {
            driver: actor.id(),
            event,
        })
    }

    fn ensure_driver(&self, actor: &Actor, transition: TransitionKind) -> Result<(), TaskDomainError> {
        if actor.is_driver() {
            Ok(())
        } else {
            Err(self.forbidden(actor, transition))
        }
    }

    fn ensure_assigned_to(
        &self,
        actor: &Actor,
        transition: TransitionKind,
    ) -> Result<(), TaskDomainError> {
        if self.assigned_to == Some(actor.id()) {
            Ok(())
        } else {
            Err(self.forbidden(actor, transition))
        }
    }

    fn ensure_status(
        &self,
        expected: TaskStatus,
        transition: TransitionKind,
    ) -> Result<(), TaskDomainError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(self.invalid_state(transition))
        }
    }

    const fn forbidden(&self, actor: &Actor, transition: TransitionKind) -> TaskDomainError {
        TaskDomainError::Forbidden {
            task_id: self.id,
            actor: actor.id(),
            transition,
        }
    }

    const fn invalid_state(&self, transition: TransitionKind) -> TaskDomainError {
        TaskDomainError::InvalidState {
            task_id: self.id,
            status: self.status,
            transition,
        }
    }

    /// Stamps the change with the current clock time and bumps the revision.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.revision = self.revision.saturating_add(1);
    }
}

fn normalize_title(title: String) -> Result<String, TaskDomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    let length = trimmed.chars().count();
    if length > Task::MAX_TITLE_LENGTH {
        return Err(TaskDomainError::TitleTooLong {
            length,
            max: Task::MAX_TITLE_LENGTH,
        });
    }
    Ok(trimmed.to_owned())
}
