//! In-memory notifier that records deliveries.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::task::ports::{Notification, Notifier, NotifierError};

/// Notifier that keeps every delivered notification in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Creates a notifier with no recorded deliveries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notifications delivered so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Delivery`] when the record lock is poisoned.
    pub fn delivered(&self) -> Result<Vec<Notification>, NotifierError> {
        let delivered = self.delivered.lock().map_err(poisoned)?;
        Ok(delivered.clone())
    }
}

fn poisoned(err: impl ToString) -> NotifierError {
    NotifierError::delivery(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifierError> {
        let mut delivered = self.delivered.lock().map_err(poisoned)?;
        delivered.push(notification);
        Ok(())
    }
}
