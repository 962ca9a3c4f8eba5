//! Error types for task domain guards, validation and parsing.

use super::{Rating, TaskId, TaskStatus, TransitionKind, UserId};
use thiserror::Error;

/// Errors returned by task lifecycle guards and domain value constructors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The actor's role or identity does not permit the transition.
    #[error("user {actor} may not {transition} task {task_id}")]
    Forbidden {
        /// Task targeted by the transition.
        task_id: TaskId,
        /// Acting user.
        actor: UserId,
        /// Requested transition.
        transition: TransitionKind,
    },

    /// The task's current status does not permit the transition.
    #[error("cannot {transition} task {task_id} while it is {status}")]
    InvalidState {
        /// Task targeted by the transition.
        task_id: TaskId,
        /// Status observed when the guard ran.
        status: TaskStatus,
        /// Requested transition.
        transition: TransitionKind,
    },

    /// The task is assigned to a different driver than the actor.
    #[error("task {task_id} is assigned to another driver ({assigned_to})")]
    AssignedElsewhere {
        /// Task targeted by the transition.
        task_id: TaskId,
        /// Current assignee.
        assigned_to: UserId,
    },

    /// The task is an unassigned marketplace task of a company the driver
    /// does not belong to, so it is not open to them.
    #[error("task {task_id} is not open to driver {driver}")]
    NotClaimable {
        /// Task targeted by the transition.
        task_id: TaskId,
        /// Driver attempting the claim.
        driver: UserId,
    },

    /// The task changed between read and write and the write was not applied.
    #[error("task {0} was modified concurrently")]
    ConcurrentModification(TaskId),

    /// The task has no assigned driver to complete it for.
    #[error("task {0} has no assigned driver")]
    Unassigned(TaskId),

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the storable length.
    #[error("task title is {length} characters long, at most {max} are allowed")]
    TitleTooLong {
        /// Title length in characters after trimming.
        length: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// An update request carried no field changes.
    #[error("task update must change at least one field")]
    EmptyUpdate,

    /// A rating value lies outside the 1.00 to 5.00 range.
    #[error("rating {0} hundredths is outside 100..=500")]
    RatingOutOfRange(i32),

    /// A rating policy's baseline does not lie between its floor and ceiling.
    #[error("rating policy needs floor {floor} <= baseline {baseline} <= ceiling {ceiling}")]
    InvalidRatingBounds {
        /// Requested lower clamp bound.
        floor: Rating,
        /// Requested starting rating.
        baseline: Rating,
        /// Requested upper clamp bound.
        ceiling: Rating,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
