//! In-memory integration tests for end-to-end task lifecycles.

use super::helpers::{Company, TestService, service, service_with, utc};
use fleetline::task::{
    adapters::memory::{InMemoryDriverRatingStore, InMemoryTaskRepository, RecordingNotifier},
    domain::{Amount, Rating, TaskStatus},
    ports::NotificationKind,
    services::ErrorKind,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn directed_offer_completed_on_schedule_raises_rating() -> Result<(), eyre::Report> {
    let company = Company::with_drivers(1);
    let driver = company.driver();
    let repository = InMemoryTaskRepository::new();
    let ratings = InMemoryDriverRatingStore::new();
    ratings.set_rating(driver.id(), Rating::from_hundredths(400)?)?;
    let notifier = RecordingNotifier::new();

    let morning = service_with(
        repository.clone(),
        ratings.clone(),
        notifier.clone(),
        utc(2025, 2, 27, 9),
    );
    let task = morning
        .create(&company.admin, company.task_request("Furniture run").offered_to(driver.id()))
        .await?;
    let accepted = morning.accept(driver, task.id()).await?;
    eyre::ensure!(accepted.task.status() == TaskStatus::Accepted, "task not accepted");
    eyre::ensure!(accepted.rating_change.is_none(), "accept must not rate");

    let delivery_day = service_with(repository, ratings, notifier.clone(), utc(2025, 3, 1, 17));
    let completed = delivery_day.complete(driver, task.id()).await?;

    let change = completed
        .rating_change
        .ok_or_else(|| eyre::eyre!("completion should adjust rating"))?;
    assert_eq!(change.rating.to_string(), "4.10");
    assert_eq!(change.reason(), "Task completed on time");
    assert_eq!(completed.task.completed_at(), Some(utc(2025, 3, 1, 17)));
    assert_eq!(
        completed.task.actual_earnings(),
        Some(Amount::from_minor_units(3_500))
    );
    assert_eq!(delivery_day.driver_rating(driver.id()).await?, change.rating);

    let kinds: Vec<_> = notifier.delivered()?.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::TaskOffered,
            NotificationKind::TaskAccepted,
            NotificationKind::TaskCompleted,
        ]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_task_can_be_claimed_by_a_colleague(service: TestService) -> Result<(), eyre::Report> {
    let company = Company::with_drivers(2);
    let [first, second] = [&company.drivers[0], &company.drivers[1]];
    let task = company.post_task(&service, "Pallet pickup").await;

    service.accept(first, task.id()).await?;
    let hidden = service.get(second, task.id()).await;
    assert_eq!(hidden.map(|_| ()).map_err(|err| err.kind()), Err(ErrorKind::NotFound));

    let rejected = service.reject(first, task.id()).await?;
    assert_eq!(
        rejected.rating_change.map(|change| change.rating.to_string()),
        Some("2.95".to_owned())
    );

    let listed = service.list(second).await?;
    assert_eq!(listed.len(), 1);
    let claimed = service.accept(second, task.id()).await?;
    assert_eq!(claimed.task.assigned_to(), Some(second.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_tasks_are_terminal(service: TestService) -> Result<(), eyre::Report> {
    let company = Company::with_drivers(1);
    let driver = company.driver();
    let task = company.post_task(&service, "Document courier").await;
    service.accept(driver, task.id()).await?;
    service.complete(&company.admin, task.id()).await?;

    for result in [
        service.accept(driver, task.id()).await,
        service.reject(driver, task.id()).await,
        service.cancel(driver, task.id()).await,
        service.complete(driver, task.id()).await,
    ] {
        let kind = result.map(|_| ()).map_err(|err| err.kind());
        eyre::ensure!(
            matches!(kind, Err(ErrorKind::InvalidState | ErrorKind::NotFound)),
            "terminal task accepted a transition: {kind:?}"
        );
    }

    let stored = service.get(&company.admin, task.id()).await?;
    assert_eq!(stored.status(), TaskStatus::Completed);
    assert_eq!(stored.assigned_to(), Some(driver.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_driver_never_sees_or_claims_the_task(
    service: TestService,
) -> Result<(), eyre::Report> {
    let home = Company::with_drivers(1);
    let away = Company::with_drivers(1);
    let task = home.post_task(&service, "Local delivery").await;

    let attempt = service.accept(away.driver(), task.id()).await;
    assert_eq!(
        attempt.map(|_| ()).map_err(|err| err.kind()),
        Err(ErrorKind::Conflict)
    );
    eyre::ensure!(
        service.list(away.driver()).await?.is_empty(),
        "foreign driver should see no tasks"
    );

    let accepted = service.accept(home.driver(), task.id()).await?;
    assert_eq!(accepted.task.assigned_to(), Some(home.driver().id()));
    Ok(())
}
