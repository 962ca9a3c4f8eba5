//! Diesel schema for task lifecycle persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Owning company.
        company_id -> Uuid,
        /// Creating user.
        created_by_id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Task lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Assigned driver, `NULL` while in the marketplace.
        assigned_to_id -> Nullable<Uuid>,
        /// Scheduled date.
        scheduled_date -> Timestamptz,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Price in minor currency units.
        price_minor -> Int8,
        /// Earnings in minor currency units.
        actual_earnings_minor -> Nullable<Int8>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Change counter guarding conditional writes.
        revision -> Int8,
    }
}

diesel::table! {
    /// Driver ratings in hundredths of a star.
    driver_ratings (driver_id) {
        /// Rated driver.
        driver_id -> Uuid,
        /// Rating in hundredths.
        rating_hundredths -> Int4,
        /// Last adjustment timestamp.
        updated_at -> Timestamptz,
    }
}
