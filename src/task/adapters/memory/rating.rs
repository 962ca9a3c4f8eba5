//! In-memory driver rating store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::task::{
    domain::{Rating, RatingDelta, RatingPolicy, UserId},
    ports::{DriverRatingStore, RatingStoreError, RatingStoreResult},
};

/// Thread-safe in-memory rating store.
///
/// Adjustments run entirely under one mutex guard, so concurrent
/// adjustments for the same driver never lose updates.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDriverRatingStore {
    ratings: Arc<Mutex<HashMap<UserId, Rating>>>,
}

impl InMemoryDriverRatingStore {
    /// Creates an empty rating store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a driver's rating.
    ///
    /// # Errors
    ///
    /// Returns [`RatingStoreError::Persistence`] when the lock is poisoned.
    pub fn set_rating(&self, driver: UserId, rating: Rating) -> RatingStoreResult<()> {
        let mut ratings = self.ratings.lock().map_err(poisoned)?;
        ratings.insert(driver, rating);
        Ok(())
    }
}

fn poisoned(err: impl ToString) -> RatingStoreError {
    RatingStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DriverRatingStore for InMemoryDriverRatingStore {
    async fn rating(&self, driver: UserId) -> RatingStoreResult<Option<Rating>> {
        let ratings = self.ratings.lock().map_err(poisoned)?;
        Ok(ratings.get(&driver).copied())
    }

    async fn adjust_rating(
        &self,
        driver: UserId,
        delta: RatingDelta,
        policy: &RatingPolicy,
    ) -> RatingStoreResult<Rating> {
        let mut ratings = self.ratings.lock().map_err(poisoned)?;
        let adjusted = policy.apply(ratings.get(&driver).copied(), delta);
        ratings.insert(driver, adjusted);
        Ok(adjusted)
    }
}
