// Session ledger for high-level session operations

use super::storage::LedgerStorage;
use super::types::{LedgerError, Session, SessionId, Tick, UserAddress};
use crate::clock::BlockClock;
use crate::notify::Notifier;
use std::sync::Arc;
use tracing::info;

/// The authoritative session ledger.
///
/// Wraps a storage backend, enforces the one-open-session-per-user state
/// machine, and emits a notification after every successful transition.
/// Sessions move `Open -> Closed` exactly once, triggered only by the owning
/// user, and closed sessions are never mutated or removed.
pub struct SessionLedger {
    storage: Arc<dyn LedgerStorage>,
    notifier: Notifier,
}

impl SessionLedger {
    /// Create a new ledger over the given storage backend.
    pub fn new(storage: Arc<dyn LedgerStorage>, notifier: Notifier) -> Self {
        Self { storage, notifier }
    }

    /// Start a new session for `caller` at `now` and return its id.
    ///
    /// Ids are assigned per user, densely from 0. Fails with
    /// [`LedgerError::SessionAlreadyOpen`] if the caller already holds an
    /// open session; nothing is mutated in that case.
    pub async fn start_session(
        &self,
        caller: &UserAddress,
        now: Tick,
    ) -> Result<SessionId, LedgerError> {
        let session_id = self.storage.open_session(caller, now).await?;

        info!(
            "Started session {} for user {} at tick {}",
            session_id, caller, now
        );

        self.notifier.session_started(caller.clone(), session_id).await;
        Ok(session_id)
    }

    /// End `caller`'s open session `session_id` at `now` and return its
    /// duration in ticks.
    ///
    /// Fails with [`LedgerError::SessionNotFound`] unless `session_id` is the
    /// caller's currently open session. A nonexistent id, an already closed
    /// id and an id owned by another user are indistinguishable to the
    /// caller.
    pub async fn end_session(
        &self,
        caller: &UserAddress,
        session_id: SessionId,
        now: Tick,
    ) -> Result<u64, LedgerError> {
        let closed = self.storage.close_session(caller, session_id, now).await?;
        let duration = now - closed.started_at;

        info!(
            "Ended session {} for user {} at tick {} (duration {} ticks)",
            session_id, caller, now, duration
        );

        self.notifier
            .session_ended(caller.clone(), session_id, duration)
            .await;
        Ok(duration)
    }

    /// Id of `user`'s currently open session, if any. Never fails.
    pub async fn current_session_for_user(&self, user: &UserAddress) -> Option<SessionId> {
        self.storage.open_session_id(user).await
    }

    /// Duration in ticks of a closed session.
    ///
    /// Fails with [`LedgerError::SessionNotFound`] if `user` has no session
    /// with this id, and with [`LedgerError::SessionStillOpen`] if the
    /// session exists but has not ended yet.
    pub async fn session_duration(
        &self,
        user: &UserAddress,
        session_id: SessionId,
    ) -> Result<u64, LedgerError> {
        let session = self
            .storage
            .session(user, session_id)
            .await
            .ok_or(LedgerError::SessionNotFound)?;

        match session.duration() {
            Some(duration) => Ok(duration),
            None => Err(LedgerError::SessionStillOpen),
        }
    }

    /// All sessions ever recorded for `user`, in creation order.
    pub async fn sessions_for_user(&self, user: &UserAddress) -> Vec<Session> {
        self.storage.user_sessions(user).await
    }
}

/// Ledger state for use in axum handlers.
#[derive(Clone)]
pub struct SessionLedgerState {
    pub ledger: Arc<SessionLedger>,
    pub clock: Arc<BlockClock>,
}

impl SessionLedgerState {
    pub fn new(ledger: SessionLedger, clock: BlockClock) -> Self {
        Self {
            ledger: Arc::new(ledger),
            clock: Arc::new(clock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::storage::MemoryLedger;
    use crate::notify::{MemorySink, SessionNotification};

    fn ledger_with_sink() -> (SessionLedger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let notifier = Notifier::new(sink.clone());
        let ledger = SessionLedger::new(Arc::new(MemoryLedger::new()), notifier);
        (ledger, sink)
    }

    #[tokio::test]
    async fn test_start_session_assigns_ids_from_zero() {
        let (ledger, _sink) = ledger_with_sink();
        let addr1 = UserAddress::from("addr1");

        let session_id = ledger.start_session(&addr1, 1).await.unwrap();
        assert_eq!(session_id, 0);
        assert_eq!(ledger.current_session_for_user(&addr1).await, Some(0));

        ledger.end_session(&addr1, session_id, 2).await.unwrap();
        let session_id = ledger.start_session(&addr1, 3).await.unwrap();
        assert_eq!(session_id, 1);
    }

    #[tokio::test]
    async fn test_end_session_returns_tick_duration() {
        let (ledger, _sink) = ledger_with_sink();
        let addr1 = UserAddress::from("addr1");

        let session_id = ledger.start_session(&addr1, 1).await.unwrap();
        let duration = ledger.end_session(&addr1, session_id, 102).await.unwrap();

        assert_eq!(duration, 101);
        assert_eq!(
            ledger.session_duration(&addr1, session_id).await.unwrap(),
            101
        );
    }

    #[tokio::test]
    async fn test_transitions_emit_notifications_in_order() {
        let (ledger, sink) = ledger_with_sink();
        let addr1 = UserAddress::from("addr1");

        let session_id = ledger.start_session(&addr1, 1).await.unwrap();
        ledger.end_session(&addr1, session_id, 102).await.unwrap();

        let notifications = sink.snapshot().await;
        assert_eq!(
            notifications,
            vec![
                SessionNotification::SessionStarted {
                    user: addr1.clone(),
                    session_id: 0,
                },
                SessionNotification::SessionEnded {
                    user: addr1,
                    session_id: 0,
                    duration: 101,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_operations_emit_nothing() {
        let (ledger, sink) = ledger_with_sink();
        let addr1 = UserAddress::from("addr1");

        ledger.start_session(&addr1, 1).await.unwrap();
        sink.drain().await;

        let err = ledger.start_session(&addr1, 2).await.unwrap_err();
        assert_eq!(err, LedgerError::SessionAlreadyOpen);
        let err = ledger.end_session(&addr1, 7, 3).await.unwrap_err();
        assert_eq!(err, LedgerError::SessionNotFound);

        assert!(sink.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_duration_query_on_open_session_fails() {
        let (ledger, _sink) = ledger_with_sink();
        let addr1 = UserAddress::from("addr1");

        let session_id = ledger.start_session(&addr1, 1).await.unwrap();

        let err = ledger.session_duration(&addr1, session_id).await.unwrap_err();
        assert_eq!(err, LedgerError::SessionStillOpen);
        let err = ledger.session_duration(&addr1, 99).await.unwrap_err();
        assert_eq!(err, LedgerError::SessionNotFound);
    }
}
