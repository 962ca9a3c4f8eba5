//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{TaskPatchRow, TaskRow},
    schema::tasks,
};
use crate::task::{
    domain::{
        Amount, CompanyId, PersistedTaskData, Task, TaskAssignment, TaskId, TaskPatch, TaskStatus,
        UserId,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskScope},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn transition_if(
        &self,
        expected: &TaskAssignment,
        task: &Task,
    ) -> TaskRepositoryResult<bool> {
        let expected_status = expected.status.as_str();
        let expected_assignee = expected.assigned_to.map(UserId::into_inner);
        let expected_revision =
            i64::try_from(expected.revision).map_err(TaskRepositoryError::persistence)?;
        let row = to_row(task)?;

        self.run_blocking(move |connection| {
            // One conditional UPDATE: the row changes only if nobody else wrote
            // it since the expected revision was read.
            let target = tasks::table
                .filter(tasks::id.eq(row.id))
                .filter(tasks::status.eq(expected_status))
                .filter(tasks::revision.eq(expected_revision));
            let affected = match expected_assignee {
                Some(driver) => diesel::update(target.filter(tasks::assigned_to_id.eq(driver)))
                    .set(&row)
                    .execute(connection),
                None => diesel::update(target.filter(tasks::assigned_to_id.is_null()))
                    .set(&row)
                    .execute(connection),
            }
            .map_err(TaskRepositoryError::persistence)?;
            Ok(affected == 1)
        })
        .await
    }

    async fn update(
        &self,
        task_id: TaskId,
        patch: &TaskPatch,
        updated_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        let changes = to_patch_row(patch, updated_at)?;

        self.run_blocking(move |connection| {
            let row = diesel::update(tasks::table.filter(tasks::id.eq(task_id.into_inner())))
                .set((&changes, tasks::revision.eq(tasks::revision + 1_i64)))
                .returning(TaskRow::as_returning())
                .get_result::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?
                .ok_or(TaskRepositoryError::NotFound(task_id))?;
            row_to_task(row)
        })
        .await
    }

    async fn list(&self, scope: TaskScope) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let query = tasks::table
                .select(TaskRow::as_select())
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .into_boxed();
            let scoped = match scope {
                TaskScope::All => query,
                TaskScope::Company(company) => {
                    query.filter(tasks::company_id.eq(company.into_inner()))
                }
                TaskScope::Driver { driver, company } => query.filter(
                    tasks::assigned_to_id.eq(driver.into_inner()).or(tasks::status
                        .eq(TaskStatus::Pending.as_str())
                        .and(tasks::assigned_to_id.is_null())
                        .and(tasks::company_id.eq(company.into_inner()))),
                ),
            };
            let rows = scoped
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

pub(super) fn to_row(task: &Task) -> TaskRepositoryResult<TaskRow> {
    let price_minor = amount_to_minor_units(task.price())?;
    let actual_earnings_minor = task
        .actual_earnings()
        .map(amount_to_minor_units)
        .transpose()?;
    let revision = i64::try_from(task.revision()).map_err(TaskRepositoryError::persistence)?;

    Ok(TaskRow {
        id: task.id().into_inner(),
        company_id: task.company_id().into_inner(),
        created_by_id: task.created_by().into_inner(),
        title: task.title().to_owned(),
        description: task.description().map(ToOwned::to_owned),
        status: task.status().as_str().to_owned(),
        assigned_to_id: task.assigned_to().map(UserId::into_inner),
        scheduled_date: task.scheduled_date(),
        completed_at: task.completed_at(),
        price_minor,
        actual_earnings_minor,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        revision,
    })
}

pub(super) fn to_patch_row(
    patch: &TaskPatch,
    updated_at: DateTime<Utc>,
) -> TaskRepositoryResult<TaskPatchRow> {
    let price_minor = patch.price().map(amount_to_minor_units).transpose()?;
    let actual_earnings_minor = patch
        .actual_earnings()
        .map(|earnings| earnings.map(amount_to_minor_units).transpose())
        .transpose()?;

    Ok(TaskPatchRow {
        title: patch.title().map(ToOwned::to_owned),
        description: patch
            .description()
            .map(|description| description.map(ToOwned::to_owned)),
        status: patch.status().map(|status| status.as_str().to_owned()),
        assigned_to_id: patch
            .assignee()
            .map(|assignee| assignee.map(UserId::into_inner)),
        scheduled_date: patch.scheduled_date(),
        price_minor,
        actual_earnings_minor,
        updated_at,
    })
}

pub(super) fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        company_id,
        created_by_id,
        title,
        description,
        status: persisted_status,
        assigned_to_id,
        scheduled_date,
        completed_at,
        price_minor,
        actual_earnings_minor,
        created_at,
        updated_at,
        revision,
    } = row;

    let status =
        TaskStatus::try_from(persisted_status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let price = minor_units_to_amount(price_minor)?;
    let actual_earnings = actual_earnings_minor
        .map(minor_units_to_amount)
        .transpose()?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        company_id: CompanyId::from_uuid(company_id),
        created_by: UserId::from_uuid(created_by_id),
        title,
        description,
        status,
        assigned_to: assigned_to_id.map(UserId::from_uuid),
        scheduled_date,
        completed_at,
        price,
        actual_earnings,
        created_at,
        updated_at,
        revision: u64::try_from(revision).map_err(TaskRepositoryError::persistence)?,
    }))
}

fn amount_to_minor_units(amount: Amount) -> TaskRepositoryResult<i64> {
    i64::try_from(amount.minor_units()).map_err(TaskRepositoryError::persistence)
}

fn minor_units_to_amount(value: i64) -> TaskRepositoryResult<Amount> {
    u64::try_from(value)
        .map(Amount::from_minor_units)
        .map_err(TaskRepositoryError::persistence)
}
