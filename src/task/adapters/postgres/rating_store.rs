//! `PostgreSQL` driver rating store.

use super::{TaskPgPool, models::RatingRow, schema::driver_ratings};
use crate::task::{
    domain::{Rating, RatingDelta, RatingPolicy, UserId},
    ports::{DriverRatingStore, RatingStoreError, RatingStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Uuid as SqlUuid};

/// Clamped upsert: the baseline seeds a missing row and the adjustment runs
/// inside the single statement, so concurrent adjustments never interleave.
const ADJUST_RATING_SQL: &str = concat!(
    "INSERT INTO driver_ratings (driver_id, rating_hundredths, updated_at) ",
    "VALUES ($1, LEAST(GREATEST($2 + $3, $4), $5), NOW()) ",
    "ON CONFLICT (driver_id) DO UPDATE SET ",
    "rating_hundredths = LEAST(GREATEST(driver_ratings.rating_hundredths + $3, $4), $5), ",
    "updated_at = NOW() ",
    "RETURNING rating_hundredths",
);

/// `PostgreSQL`-backed driver rating store.
#[derive(Debug, Clone)]
pub struct PostgresDriverRatingStore {
    pool: TaskPgPool,
}

impl PostgresDriverRatingStore {
    /// Creates a new rating store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> RatingStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RatingStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RatingStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RatingStoreError::persistence)?
    }
}

#[async_trait]
impl DriverRatingStore for PostgresDriverRatingStore {
    async fn rating(&self, driver: UserId) -> RatingStoreResult<Option<Rating>> {
        self.run_blocking(move |connection| {
            let stored = driver_ratings::table
                .find(driver.into_inner())
                .select(driver_ratings::rating_hundredths)
                .first::<i32>(connection)
                .optional()
                .map_err(RatingStoreError::persistence)?;
            stored
                .map(Rating::from_hundredths)
                .transpose()
                .map_err(RatingStoreError::persistence)
        })
        .await
    }

    async fn adjust_rating(
        &self,
        driver: UserId,
        delta: RatingDelta,
        policy: &RatingPolicy,
    ) -> RatingStoreResult<Rating> {
        let baseline = i32::from(policy.baseline());
        let floor = i32::from(policy.floor());
        let ceiling = i32::from(policy.ceiling());
        let delta_hundredths = i32::from(delta.hundredths());

        self.run_blocking(move |connection| {
            let row = diesel::sql_query(ADJUST_RATING_SQL)
                .bind::<SqlUuid, _>(driver.into_inner())
                .bind::<Integer, _>(baseline)
                .bind::<Integer, _>(delta_hundredths)
                .bind::<Integer, _>(floor)
                .bind::<Integer, _>(ceiling)
                .get_result::<RatingRow>(connection)
                .map_err(RatingStoreError::persistence)?;
            Rating::from_hundredths(row.rating_hundredths).map_err(RatingStoreError::persistence)
        })
        .await
    }
}
