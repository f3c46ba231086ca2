// Notification emitter

use super::sink::NotificationSink;
use super::types::SessionNotification;
use crate::ledger::types::{SessionId, UserAddress};
use std::sync::Arc;
use tracing::{error, info};

/// Emits ledger notifications to the configured sink.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    /// Create a new notifier with the specified sink.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Deliver a notification, logging it on the way out.
    ///
    /// Delivery failures are logged and swallowed: the ledger mutation is the
    /// authoritative record and is never rolled back for a sink error.
    pub async fn emit(&self, notification: SessionNotification) {
        info!(
            "Notification: {} for user {} (session {})",
            notification.as_str(),
            notification.user(),
            notification.session_id()
        );

        if let Err(e) = self.sink.deliver(notification).await {
            error!("Failed to deliver notification: {}", e);
        }
    }

    pub async fn session_started(&self, user: UserAddress, session_id: SessionId) {
        self.emit(SessionNotification::SessionStarted { user, session_id })
            .await;
    }

    pub async fn session_ended(&self, user: UserAddress, session_id: SessionId, duration: u64) {
        self.emit(SessionNotification::SessionEnded {
            user,
            session_id,
            duration,
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::sink::MemorySink;

    #[tokio::test]
    async fn test_emit_reaches_the_sink() {
        let sink = Arc::new(MemorySink::new());
        let notifier = Notifier::new(sink.clone());

        notifier.session_started(UserAddress::from("addr1"), 0).await;
        notifier.session_ended(UserAddress::from("addr1"), 0, 101).await;

        let notifications = sink.snapshot().await;
        assert_eq!(
            notifications,
            vec![
                SessionNotification::SessionStarted {
                    user: UserAddress::from("addr1"),
                    session_id: 0,
                },
                SessionNotification::SessionEnded {
                    user: UserAddress::from("addr1"),
                    session_id: 0,
                    duration: 101,
                },
            ]
        );
    }
}
