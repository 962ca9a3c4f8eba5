//! Diesel row models for task and rating persistence.

use super::schema::{driver_ratings, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result and insert row for task records.
///
/// Used as a changeset for whole-row writes, so `None` clears nullable
/// columns instead of leaving them untouched.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Owning company.
    pub company_id: uuid::Uuid,
    /// Creating user.
    pub created_by_id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Assigned driver.
    pub assigned_to_id: Option<uuid::Uuid>,
    /// Scheduled date.
    pub scheduled_date: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Price in minor units.
    pub price_minor: i64,
    /// Earnings in minor units.
    pub actual_earnings_minor: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Change counter.
    pub revision: i64,
}

/// Column-scoped changeset for administrative patches.
///
/// `None` leaves a column untouched; `Some(None)` clears a nullable one.
/// The revision is bumped by the statement itself rather than set here.
#[derive(Debug, Clone, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskPatchRow {
    /// Replacement title.
    pub title: Option<String>,
    /// Description change.
    pub description: Option<Option<String>>,
    /// Replacement status.
    pub status: Option<String>,
    /// Assignment change.
    pub assigned_to_id: Option<Option<uuid::Uuid>>,
    /// Replacement scheduled date.
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Replacement price in minor units.
    pub price_minor: Option<i64>,
    /// Earnings change in minor units.
    pub actual_earnings_minor: Option<Option<i64>>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Rating value returned by adjustment statements.
#[derive(Debug, Clone, Copy, QueryableByName)]
#[diesel(table_name = driver_ratings)]
pub struct RatingRow {
    /// Rating in hundredths.
    pub rating_hundredths: i32,
}
