//! Shared fixtures for task lifecycle unit tests.

use crate::task::domain::{Actor, Amount, CompanyId, Task, TaskDraft, UserId};
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Creates a clock frozen at the given UTC wall time.
    pub fn at(year: i32, month: u32, day: u32, hour: u32) -> Self {
        Self(utc(year, month, day, hour))
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Builds a UTC timestamp on the hour.
pub fn utc(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Actors spread across two companies.
#[derive(Debug, Clone, Copy)]
pub struct Fleet {
    pub company: CompanyId,
    pub other_company: CompanyId,
    pub admin: Actor,
    pub foreign_admin: Actor,
    pub super_admin: Actor,
    pub driver: Actor,
    pub colleague: Actor,
    pub foreign_driver: Actor,
}

#[fixture]
pub fn fleet() -> Fleet {
    let company = CompanyId::new();
    let other_company = CompanyId::new();
    Fleet {
        company,
        other_company,
        admin: Actor::company_admin(UserId::new(), company),
        foreign_admin: Actor::company_admin(UserId::new(), other_company),
        super_admin: Actor::super_admin(UserId::new()),
        driver: Actor::driver(UserId::new(), company),
        colleague: Actor::driver(UserId::new(), company),
        foreign_driver: Actor::driver(UserId::new(), other_company),
    }
}

#[fixture]
pub fn clock() -> FixedClock {
    FixedClock::at(2025, 1, 10, 12)
}

/// Creates a pending task for the fleet's company scheduled on 2025-01-10.
pub fn pending_task(fleet: &Fleet, offered_to: Option<&Actor>) -> Task {
    let draft = TaskDraft {
        company_id: fleet.company,
        created_by: fleet.admin.id(),
        title: "Deliver parcels".to_owned(),
        description: None,
        price: Amount::from_minor_units(4_500),
        scheduled_date: utc(2025, 1, 10, 8),
        offered_to: offered_to.map(Actor::id),
    };
    Task::new(draft, &FixedClock::at(2025, 1, 1, 9)).expect("valid task draft")
}

/// Creates a task already accepted by `driver`.
pub fn accepted_task(fleet: &Fleet, driver: &Actor) -> Task {
    let mut task = pending_task(fleet, None);
    task.accept(driver, &FixedClock::at(2025, 1, 2, 9))
        .expect("accept in fixture");
    task
}
