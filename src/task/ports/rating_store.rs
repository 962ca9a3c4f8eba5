//! Driver rating store port.

use crate::task::domain::{Rating, RatingDelta, RatingPolicy, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for rating store operations.
pub type RatingStoreResult<T> = Result<T, RatingStoreError>;

/// Persistence contract for driver ratings.
#[async_trait]
pub trait DriverRatingStore: Send + Sync {
    /// Returns the driver's current rating, or `None` if never rated.
    async fn rating(&self, driver: UserId) -> RatingStoreResult<Option<Rating>>;

    /// Atomically applies `delta` to the driver's rating and returns the
    /// stored result.
    ///
    /// The read-modify-write must be serialized per driver. The new value is
    /// `policy.apply(current, delta)`, so a missing rating starts from the
    /// policy baseline and the result stays within the policy bounds.
    async fn adjust_rating(
        &self,
        driver: UserId,
        delta: RatingDelta,
        policy: &RatingPolicy,
    ) -> RatingStoreResult<Rating>;
}

/// Errors returned by rating store implementations.
#[derive(Debug, Clone, Error)]
pub enum RatingStoreError {
    /// Persistence-layer failure.
    #[error("rating persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RatingStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
