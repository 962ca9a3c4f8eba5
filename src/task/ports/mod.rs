//! Port contracts for the task lifecycle.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod notifier;
pub mod rating_store;
pub mod repository;

pub use notifier::{Notification, NotificationKind, Notifier, NotifierError};
pub use rating_store::{DriverRatingStore, RatingStoreError, RatingStoreResult};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskScope};
