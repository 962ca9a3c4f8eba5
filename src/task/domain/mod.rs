//! Domain model for the task lifecycle.
//!
//! The task domain models the guarded lifecycle transitions, the driver
//! rating policy and the marketplace visibility rule while keeping all
//! infrastructure concerns outside of the domain boundary.

mod actor;
mod error;
mod ids;
mod rating;
mod task;
mod visibility;

pub use actor::{Actor, ActorRole};
pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{Amount, CompanyId, TaskId, UserId};
pub use rating::{
    Rating, RatingAdjustment, RatingChange, RatingDelta, RatingEvent, RatingPolicy,
};
pub use task::{
    PersistedTaskData, Task, TaskAssignment, TaskDraft, TaskPatch, TaskStatus, TransitionKind,
};
pub use visibility::{filter_visible, is_visible_to};
