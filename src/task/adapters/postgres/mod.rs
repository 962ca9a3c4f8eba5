//! `PostgreSQL` adapters for task lifecycle persistence.

mod models;
mod rating_store;
mod repository;
mod schema;

pub use rating_store::PostgresDriverRatingStore;
pub use repository::{PostgresTaskRepository, TaskPgPool};
