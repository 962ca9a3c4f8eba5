//! Tests proving notification failures never undo committed transitions.

use super::helpers::{Company, service_with, utc};
use async_trait::async_trait;
use fleetline::task::{
    adapters::memory::{InMemoryDriverRatingStore, InMemoryTaskRepository},
    domain::TaskStatus,
    ports::{Notification, NotificationKind, Notifier, NotifierError},
};
use mockall::{mock, predicate::function};
use rstest::rstest;

mock! {
    pub Channel {}

    #[async_trait]
    impl Notifier for Channel {
        async fn notify(&self, notification: Notification) -> Result<(), NotifierError>;
    }
}

fn unreachable_channel() -> NotifierError {
    NotifierError::delivery(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "push gateway unreachable",
    ))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_notifier_does_not_fail_transitions() -> Result<(), eyre::Report> {
    let company = Company::with_drivers(1);
    let driver = company.driver();
    let mut notifier = MockChannel::new();
    notifier
        .expect_notify()
        .with(function(|n: &Notification| n.kind == NotificationKind::TaskAccepted))
        .times(1)
        .returning(|_| Err(unreachable_channel()));
    notifier
        .expect_notify()
        .with(function(|n: &Notification| n.kind == NotificationKind::TaskCompleted))
        .times(1)
        .returning(|_| Err(unreachable_channel()));

    let service = service_with(
        InMemoryTaskRepository::new(),
        InMemoryDriverRatingStore::new(),
        notifier,
        utc(2025, 3, 1, 12),
    );
    let task = company.post_task(&service, "Late-night drop").await;

    let accepted = service.accept(driver, task.id()).await?;
    assert_eq!(accepted.task.status(), TaskStatus::Accepted);
    let completed = service.complete(driver, task.id()).await?;
    assert_eq!(completed.task.status(), TaskStatus::Completed);
    assert_eq!(
        completed.rating_change.map(|change| change.rating.to_string()),
        Some("3.10".to_owned())
    );

    let stored = service.get(&company.admin, task.id()).await?;
    assert_eq!(stored, completed.task);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notifications_are_addressed_to_the_task_creator() -> Result<(), eyre::Report> {
    let company = Company::with_drivers(1);
    let driver = company.driver();
    let creator = company.admin.id();
    let mut notifier = MockChannel::new();
    notifier
        .expect_notify()
        .with(function(move |n: &Notification| {
            n.recipient == creator && n.kind == NotificationKind::TaskAccepted
        }))
        .times(1)
        .returning(|_| Ok(()));

    let service = service_with(
        InMemoryTaskRepository::new(),
        InMemoryDriverRatingStore::new(),
        notifier,
        utc(2025, 3, 1, 12),
    );
    let task = company.post_task(&service, "Morning route").await;
    service.accept(driver, task.id()).await?;
    Ok(())
}
