//! Concurrency tests for racing task claims.

use std::sync::Arc;

use super::helpers::{Company, TestService, service};
use fleetline::task::{domain::TaskStatus, services::ErrorKind};
use rstest::rstest;
use tokio::task::JoinSet;

#[rstest]
#[case::pair(2)]
#[case::crowd(16)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_racing_driver_wins(
    service: TestService,
    #[case] drivers: usize,
) -> Result<(), eyre::Report> {
    let company = Company::with_drivers(drivers);
    let task_id = company.post_task(&service, "Contested pickup").await.id();
    let service = Arc::new(service);

    let mut racers = JoinSet::new();
    for driver in company.drivers.iter().copied() {
        let service = Arc::clone(&service);
        racers.spawn(async move {
            let result = service.accept(&driver, task_id).await;
            (driver.id(), result.map(|_| ()).map_err(|err| err.kind()))
        });
    }

    let mut winners = Vec::new();
    while let Some(joined) = racers.join_next().await {
        let (driver, outcome) = joined?;
        match outcome {
            Ok(()) => winners.push(driver),
            Err(ErrorKind::Conflict | ErrorKind::InvalidState) => {}
            Err(other) => eyre::bail!("unexpected race outcome for {driver}: {other:?}"),
        }
    }

    let [winner] = winners.as_slice() else {
        eyre::bail!("expected one winner, got {winners:?}");
    };
    let stored = service.get(&company.admin, task_id).await?;
    assert_eq!(stored.status(), TaskStatus::Accepted);
    assert_eq!(stored.assigned_to(), Some(*winner));
    Ok(())
}

/// Order in which the home and away drivers reach the task.
#[derive(Debug, Clone, Copy)]
enum Arrival {
    Together,
    AwayFirst,
    HomeFirst,
}

#[rstest]
#[case::together(Arrival::Together)]
#[case::away_first(Arrival::AwayFirst)]
#[case::home_first(Arrival::HomeFirst)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn driver_from_other_company_always_conflicts(
    service: TestService,
    #[case] arrival: Arrival,
) -> Result<(), eyre::Report> {
    let home = Company::with_drivers(1);
    let away = Company::with_drivers(1);
    let task_id = home.post_task(&service, "Cross-town parcel").await.id();
    let service = Arc::new(service);

    let (home_result, away_result) = match arrival {
        Arrival::Together => tokio::join!(
            service.accept(home.driver(), task_id),
            service.accept(away.driver(), task_id),
        ),
        Arrival::AwayFirst => {
            let away_result = service.accept(away.driver(), task_id).await;
            (service.accept(home.driver(), task_id).await, away_result)
        }
        Arrival::HomeFirst => {
            let home_result = service.accept(home.driver(), task_id).await;
            (home_result, service.accept(away.driver(), task_id).await)
        }
    };

    let won = home_result?;
    assert_eq!(won.task.assigned_to(), Some(home.driver().id()));
    assert_eq!(
        away_result.map(|_| ()).map_err(|err| err.kind()),
        Err(ErrorKind::Conflict)
    );
    eyre::ensure!(
        service.list(away.driver()).await?.is_empty(),
        "foreign driver should not see the claimed task"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reject_and_complete_race_leaves_one_consistent_state(
    service: TestService,
) -> Result<(), eyre::Report> {
    let company = Company::with_drivers(1);
    let driver = *company.driver();
    let task_id = company.post_task(&service, "Fragile delivery").await.id();
    service.accept(&driver, task_id).await?;
    let service = Arc::new(service);

    let rejecting = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.reject(&driver, task_id).await.is_ok() })
    };
    let completing = {
        let service = Arc::clone(&service);
        let admin = company.admin;
        tokio::spawn(async move { service.complete(&admin, task_id).await.is_ok() })
    };
    let rejected = rejecting.await?;
    let completed = completing.await?;

    let stored = service.get(&company.admin, task_id).await?;
    match (rejected, completed) {
        (true, false) => eyre::ensure!(stored.is_in_marketplace(), "rejected task not returned"),
        (false, true) => eyre::ensure!(
            stored.status() == TaskStatus::Completed,
            "completed task not terminal"
        ),
        outcome => eyre::bail!("expected exactly one winner, got {outcome:?}"),
    }
    Ok(())
}
