//! Outbound notification port.

use crate::task::domain::{TaskId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Lifecycle event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was offered directly to the recipient.
    TaskOffered,
    /// A driver accepted the recipient's task.
    TaskAccepted,
    /// A driver rejected the recipient's task.
    TaskRejected,
    /// A driver cancelled the recipient's task.
    TaskCancelled,
    /// The recipient's task was completed.
    TaskCompleted,
}

/// Message handed to the notifier after a transition commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// User the notification is addressed to.
    pub recipient: UserId,
    /// Event kind.
    pub kind: NotificationKind,
    /// Task the event concerns.
    pub task_id: TaskId,
    /// Event-specific details for the delivery channel.
    pub payload: Value,
}

/// Delivery contract for push, email or in-app notifications.
///
/// Callers treat failures as non-fatal: a committed transition stays
/// committed whatever this returns.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    async fn notify(&self, notification: Notification) -> Result<(), NotifierError>;
}

/// Errors returned by notifier implementations.
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    /// The delivery channel rejected or failed the notification.
    #[error("notification delivery failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotifierError {
    /// Wraps a delivery error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
