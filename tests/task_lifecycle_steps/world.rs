//! Shared world state for task lifecycle BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use fleetline::task::{
    adapters::memory::{InMemoryDriverRatingStore, InMemoryTaskRepository, RecordingNotifier},
    domain::{Actor, CompanyId, RatingChange, Task, TaskId, UserId},
    services::{TaskLifecycleResult, TaskLifecycleService, TransitionOutcome},
};
use mockable::Clock;
use rstest::fixture;

/// Clock frozen at the instant a step acts on.
#[derive(Debug, Clone, Copy)]
pub struct StepClock(pub DateTime<Utc>);

impl Clock for StepClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryDriverRatingStore,
    RecordingNotifier,
    StepClock,
>;

/// Scenario world for task lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub repository: InMemoryTaskRepository,
    pub ratings: InMemoryDriverRatingStore,
    pub notifier: RecordingNotifier,
    pub company: CompanyId,
    pub admin: Actor,
    pub drivers: HashMap<String, Actor>,
    pub task: Option<Task>,
    pub last_result: Option<TaskLifecycleResult<TransitionOutcome>>,
    pub last_rating_change: Option<RatingChange>,
}

impl LifecycleWorld {
    /// Creates a world with one company and no drivers.
    #[must_use]
    pub fn new() -> Self {
        let company = CompanyId::new();
        Self {
            repository: InMemoryTaskRepository::new(),
            ratings: InMemoryDriverRatingStore::new(),
            notifier: RecordingNotifier::new(),
            company,
            admin: Actor::company_admin(UserId::new(), company),
            drivers: HashMap::new(),
            task: None,
            last_result: None,
            last_rating_change: None,
        }
    }

    /// Builds a service over the world's stores, frozen at `now`.
    #[must_use]
    pub fn service_at(&self, now: DateTime<Utc>) -> TestTaskService {
        TaskLifecycleService::new(
            Arc::new(self.repository.clone()),
            Arc::new(self.ratings.clone()),
            Arc::new(self.notifier.clone()),
            Arc::new(StepClock(now)),
        )
    }

    /// Looks up a named driver.
    ///
    /// # Errors
    ///
    /// Returns an error if no driver with that name joined the scenario.
    pub fn driver(&self, name: &str) -> Result<Actor, eyre::Report> {
        self.drivers
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown driver {name} in scenario world"))
    }

    /// Returns the scenario task's identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no task has been created yet.
    pub fn task_id(&self) -> Result<TaskId, eyre::Report> {
        self.task
            .as_ref()
            .map(Task::id)
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Parses a scenario date as midday UTC.
///
/// # Errors
///
/// Returns an error if the date is not formatted as `YYYY-MM-DD`.
pub fn midday(date: &str) -> Result<DateTime<Utc>, eyre::Report> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|err| eyre::eyre!("invalid scenario date {date}: {err}"))?;
    day.and_hms_opt(12, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| eyre::eyre!("invalid midday for {date}"))
}

/// Parses a two-decimal rating such as `4.10` into hundredths.
///
/// # Errors
///
/// Returns an error if the text is not a two-decimal number.
pub fn rating_hundredths(text: &str) -> Result<i32, eyre::Report> {
    let (whole, fraction) = text
        .split_once('.')
        .filter(|(_, fraction)| fraction.len() == 2)
        .ok_or_else(|| eyre::eyre!("rating {text} must have two decimals"))?;
    let whole: i32 = whole.parse()?;
    let fraction: i32 = fraction.parse()?;
    Ok(whole * 100 + fraction)
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
