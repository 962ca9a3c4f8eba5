//! In-memory adapters for the task lifecycle ports.

mod notifier;
mod rating;
mod task;

pub use notifier::RecordingNotifier;
pub use rating::InMemoryDriverRatingStore;
pub use task::InMemoryTaskRepository;
