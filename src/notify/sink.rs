// Notification sinks

use super::types::SessionNotification;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for notification delivery backends.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification. Called synchronously after the mutation
    /// that produced it, in emission order.
    async fn deliver(&self, notification: SessionNotification) -> Result<(), String>;
}

/// In-memory notification sink.
///
/// Retains every notification in emission order so external listeners and
/// tests can observe what the ledger emitted.
pub struct MemorySink {
    notifications: Arc<RwLock<Vec<SessionNotification>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            notifications: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// All notifications delivered so far, in emission order.
    pub async fn snapshot(&self) -> Vec<SessionNotification> {
        let notifications = self.notifications.read().await;
        notifications.clone()
    }

    /// Remove and return all delivered notifications.
    pub async fn drain(&self) -> Vec<SessionNotification> {
        let mut notifications = self.notifications.write().await;
        std::mem::take(&mut *notifications)
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn deliver(&self, notification: SessionNotification) -> Result<(), String> {
        let mut notifications = self.notifications.write().await;
        notifications.push(notification);
        Ok(())
    }
}
