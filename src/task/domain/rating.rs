//! Driver rating values and the rating adjustment policy.
//!
//! Ratings are fixed-point values counted in hundredths of a star, so the
//! two-decimal precision of a rating is exact and every adjustment rounds
//! trivially. The policy is pure: it maps lifecycle events to deltas and
//! clamps the adjusted rating, leaving persistence to the rating store.

use super::{TaskDomainError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Driver rating between 1.00 and 5.00, stored in hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(u16);

impl Rating {
    /// Lowest representable rating (1.00).
    pub const MIN: Self = Self(100);
    /// Highest representable rating (5.00).
    pub const MAX: Self = Self(500);
    /// Rating assumed for drivers that have never been rated (3.00).
    pub const BASELINE: Self = Self(300);

    /// Creates a rating from hundredths of a star.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::RatingOutOfRange`] when the value lies
    /// outside `100..=500`.
    pub fn from_hundredths(value: i32) -> Result<Self, TaskDomainError> {
        u16::try_from(value)
            .ok()
            .filter(|hundredths| (Self::MIN.0..=Self::MAX.0).contains(hundredths))
            .map(Self)
            .ok_or(TaskDomainError::RatingOutOfRange(value))
    }

    /// Returns the rating in hundredths of a star.
    #[must_use]
    pub const fn hundredths(self) -> u16 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = TaskDomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_hundredths(value)
    }
}

impl From<Rating> for i32 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0.div_euclid(100), self.0.rem_euclid(100))
    }
}

/// Signed rating adjustment in hundredths of a star.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingDelta(i16);

impl RatingDelta {
    /// Creates a delta from hundredths of a star.
    #[must_use]
    pub const fn from_hundredths(value: i16) -> Self {
        Self(value)
    }

    /// Returns the delta in hundredths of a star.
    #[must_use]
    pub const fn hundredths(self) -> i16 {
        self.0
    }
}

impl fmt::Display for RatingDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let magnitude = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:02}",
            magnitude.div_euclid(100),
            magnitude.rem_euclid(100)
        )
    }
}

/// Lifecycle event that adjusts the rating of the driver involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingEvent {
    /// Completed on a calendar day before the scheduled one.
    CompletedEarly,
    /// Completed on the scheduled calendar day.
    CompletedOnTime,
    /// Completed on a calendar day after the scheduled one.
    CompletedLate,
    /// An accepted task was rejected by its driver.
    RejectedAfterAcceptance,
    /// An accepted task was cancelled by its driver.
    CancelledAfterAcceptance,
}

impl RatingEvent {
    /// Classifies a completion by comparing UTC calendar days.
    ///
    /// Time of day is ignored: anything completed on the scheduled date is on
    /// time.
    #[must_use]
    pub fn for_completion(completed_at: DateTime<Utc>, scheduled_date: DateTime<Utc>) -> Self {
        match completed_at.date_naive().cmp(&scheduled_date.date_naive()) {
            Ordering::Less => Self::CompletedEarly,
            Ordering::Equal => Self::CompletedOnTime,
            Ordering::Greater => Self::CompletedLate,
        }
    }

    /// Returns the human-readable reason reported with the adjustment.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::CompletedEarly => "Task completed early",
            Self::CompletedOnTime => "Task completed on time",
            Self::CompletedLate => "Task completed late",
            Self::RejectedAfterAcceptance => "Task rejected after acceptance",
            Self::CancelledAfterAcceptance => "Task cancelled after acceptance",
        }
    }
}

impl fmt::Display for RatingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Rating event owed to a specific driver by a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingAdjustment {
    /// Driver whose rating changes.
    pub driver: UserId,
    /// Event that triggered the change.
    pub event: RatingEvent,
}

/// Rating adjustment applied by a transition, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    /// Driver whose rating changed.
    pub driver: UserId,
    /// Event that triggered the change.
    pub event: RatingEvent,
    /// Delta requested by the policy before clamping.
    pub delta: RatingDelta,
    /// Rating stored after the adjustment.
    pub rating: Rating,
}

impl RatingChange {
    /// Returns the human-readable reason for the change.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        self.event.reason()
    }
}

/// Rating adjustment policy.
///
/// The floor, baseline and ceiling are validated together, so applying a
/// delta always lands on a rating inside the policy's bounds.
///
/// # Examples
///
/// ```
/// use fleetline::task::domain::{Rating, RatingEvent, RatingPolicy};
///
/// let policy = RatingPolicy::default();
/// let delta = policy.delta(RatingEvent::CompletedOnTime);
/// let next = policy.apply(Rating::from_hundredths(400).ok(), delta);
/// assert_eq!(next.to_string(), "4.10");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingPolicy {
    baseline: Rating,
    floor: Rating,
    ceiling: Rating,
    completed_early: RatingDelta,
    completed_on_time: RatingDelta,
    completed_late: RatingDelta,
    rejected_after_acceptance: RatingDelta,
    cancelled_after_acceptance: RatingDelta,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            baseline: Rating::BASELINE,
            floor: Rating::MIN,
            ceiling: Rating::MAX,
            completed_early: RatingDelta::from_hundredths(15),
            completed_on_time: RatingDelta::from_hundredths(10),
            completed_late: RatingDelta::from_hundredths(-20),
            rejected_after_acceptance: RatingDelta::from_hundredths(-5),
            cancelled_after_acceptance: RatingDelta::from_hundredths(-10),
        }
    }
}

impl RatingPolicy {
    /// Replaces the clamp bounds and the rating assumed for unrated drivers.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRatingBounds`] unless
    /// `floor <= baseline <= ceiling`.
    pub fn with_bounds(
        mut self,
        floor: Rating,
        baseline: Rating,
        ceiling: Rating,
    ) -> Result<Self, TaskDomainError> {
        if floor > baseline || baseline > ceiling {
            return Err(TaskDomainError::InvalidRatingBounds {
                floor,
                baseline,
                ceiling,
            });
        }
        self.floor = floor;
        self.baseline = baseline;
        self.ceiling = ceiling;
        Ok(self)
    }

    /// Replaces the delta assigned to `event`.
    #[must_use]
    pub const fn with_delta(mut self, event: RatingEvent, delta: RatingDelta) -> Self {
        match event {
            RatingEvent::CompletedEarly => self.completed_early = delta,
            RatingEvent::CompletedOnTime => self.completed_on_time = delta,
            RatingEvent::CompletedLate => self.completed_late = delta,
            RatingEvent::RejectedAfterAcceptance => self.rejected_after_acceptance = delta,
            RatingEvent::CancelledAfterAcceptance => self.cancelled_after_acceptance = delta,
        }
        self
    }

    /// Returns the rating assumed for drivers without one.
    #[must_use]
    pub const fn baseline(&self) -> Rating {
        self.baseline
    }

    /// Returns the lower clamp bound.
    #[must_use]
    pub const fn floor(&self) -> Rating {
        self.floor
    }

    /// Returns the upper clamp bound.
    #[must_use]
    pub const fn ceiling(&self) -> Rating {
        self.ceiling
    }

    /// Returns the delta the policy assigns to `event`.
    #[must_use]
    pub const fn delta(&self, event: RatingEvent) -> RatingDelta {
        match event {
            RatingEvent::CompletedEarly => self.completed_early,
            RatingEvent::CompletedOnTime => self.completed_on_time,
            RatingEvent::CompletedLate => self.completed_late,
            RatingEvent::RejectedAfterAcceptance => self.rejected_after_acceptance,
            RatingEvent::CancelledAfterAcceptance => self.cancelled_after_acceptance,
        }
    }

    /// Applies `delta` to `current`, falling back to the baseline, and clamps
    /// the result into `floor..=ceiling`.
    #[must_use]
    pub fn apply(&self, current: Option<Rating>, delta: RatingDelta) -> Rating {
        let start = current.unwrap_or(self.baseline).0;
        Rating(
            start
                .saturating_add_signed(delta.0)
                .clamp(self.floor.0, self.ceiling.0),
        )
    }
}
