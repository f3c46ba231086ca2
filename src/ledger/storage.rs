// Ledger storage backends

use super::types::{LedgerError, Session, SessionId, Tick, UserAddress};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Per-user slice of the ledger.
///
/// `sessions` is append-only and indexed by session id: ids are allocated
/// densely from 0, so `sessions[id]` is the session with that id and
/// `sessions.len()` is the next id to assign. `open_session_id`, when
/// present, always names an existing open session in `sessions`.
#[derive(Debug, Clone, Default)]
struct UserLedger {
    open_session_id: Option<SessionId>,
    sessions: Vec<Session>,
}

/// Trait for ledger storage backends.
///
/// Each mutating method is one atomic transition: it either applies fully or
/// returns an error having changed nothing. Reads observe the last completed
/// transition and never fail.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Open a new session for `user` at `now` and return its id.
    async fn open_session(&self, user: &UserAddress, now: Tick) -> Result<SessionId, LedgerError>;

    /// Close `user`'s currently open session `session_id` at `now` and
    /// return the closed record.
    async fn close_session(
        &self,
        user: &UserAddress,
        session_id: SessionId,
        now: Tick,
    ) -> Result<Session, LedgerError>;

    /// Id of `user`'s currently open session, if any.
    async fn open_session_id(&self, user: &UserAddress) -> Option<SessionId>;

    /// Look up a session by owner and id.
    async fn session(&self, user: &UserAddress, session_id: SessionId) -> Option<Session>;

    /// All sessions ever recorded for `user`, in creation order.
    async fn user_sessions(&self, user: &UserAddress) -> Vec<Session>;
}

/// In-memory authoritative ledger.
///
/// The write lock serializes mutating transitions; concurrent reads share the
/// read lock and see a consistent snapshot.
pub struct MemoryLedger {
    users: Arc<RwLock<HashMap<UserAddress, UserLedger>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStorage for MemoryLedger {
    async fn open_session(&self, user: &UserAddress, now: Tick) -> Result<SessionId, LedgerError> {
        let mut users = self.users.write().await;
        let ledger = users.entry(user.clone()).or_default();

        if ledger.open_session_id.is_some() {
            return Err(LedgerError::SessionAlreadyOpen);
        }

        let session_id = ledger.sessions.len() as SessionId;
        ledger.sessions.push(Session {
            id: session_id,
            owner: user.clone(),
            started_at: now,
            ended_at: None,
        });
        ledger.open_session_id = Some(session_id);

        debug!("Opened session {} for user {} at tick {}", session_id, user, now);
        Ok(session_id)
    }

    async fn close_session(
        &self,
        user: &UserAddress,
        session_id: SessionId,
        now: Tick,
    ) -> Result<Session, LedgerError> {
        let mut users = self.users.write().await;
        let ledger = users.get_mut(user).ok_or(LedgerError::SessionNotFound)?;

        if ledger.open_session_id != Some(session_id) {
            return Err(LedgerError::SessionNotFound);
        }

        // open_session_id always names an existing session, so indexing holds
        let session = &mut ledger.sessions[session_id as usize];
        session.ended_at = Some(now);
        ledger.open_session_id = None;

        debug!("Closed session {} for user {} at tick {}", session_id, user, now);
        Ok(session.clone())
    }

    async fn open_session_id(&self, user: &UserAddress) -> Option<SessionId> {
        let users = self.users.read().await;
        users.get(user).and_then(|ledger| ledger.open_session_id)
    }

    async fn session(&self, user: &UserAddress, session_id: SessionId) -> Option<Session> {
        let users = self.users.read().await;
        users
            .get(user)
            .and_then(|ledger| ledger.sessions.get(session_id as usize))
            .cloned()
    }

    async fn user_sessions(&self, user: &UserAddress) -> Vec<Session> {
        let users = self.users.read().await;
        users
            .get(user)
            .map(|ledger| ledger.sessions.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_and_close_session() {
        let storage = MemoryLedger::new();
        let user = UserAddress::from("addr1");

        let session_id = storage.open_session(&user, 1).await.unwrap();
        assert_eq!(session_id, 0);
        assert_eq!(storage.open_session_id(&user).await, Some(0));

        let closed = storage.close_session(&user, session_id, 42).await.unwrap();
        assert_eq!(closed.started_at, 1);
        assert_eq!(closed.ended_at, Some(42));
        assert_eq!(storage.open_session_id(&user).await, None);
    }

    #[tokio::test]
    async fn test_second_open_fails_without_mutation() {
        let storage = MemoryLedger::new();
        let user = UserAddress::from("addr1");

        storage.open_session(&user, 1).await.unwrap();
        let err = storage.open_session(&user, 2).await.unwrap_err();
        assert_eq!(err, LedgerError::SessionAlreadyOpen);

        // Still exactly one session, still open under the same id
        assert_eq!(storage.user_sessions(&user).await.len(), 1);
        assert_eq!(storage.open_session_id(&user).await, Some(0));
    }

    #[tokio::test]
    async fn test_close_rejects_ids_that_are_not_the_open_session() {
        let storage = MemoryLedger::new();
        let user = UserAddress::from("addr1");

        // No sessions at all
        let err = storage.close_session(&user, 0, 5).await.unwrap_err();
        assert_eq!(err, LedgerError::SessionNotFound);

        let session_id = storage.open_session(&user, 1).await.unwrap();
        storage.close_session(&user, session_id, 5).await.unwrap();

        // Already closed
        let err = storage.close_session(&user, session_id, 6).await.unwrap_err();
        assert_eq!(err, LedgerError::SessionNotFound);

        // Never allocated
        let err = storage.close_session(&user, session_id + 1, 6).await.unwrap_err();
        assert_eq!(err, LedgerError::SessionNotFound);
    }

    #[tokio::test]
    async fn test_session_ids_are_dense_and_monotonic() {
        let storage = MemoryLedger::new();
        let user = UserAddress::from("addr1");

        for expected_id in 0..3 {
            let session_id = storage.open_session(&user, expected_id).await.unwrap();
            assert_eq!(session_id, expected_id);
            storage.close_session(&user, session_id, expected_id + 1).await.unwrap();
        }

        let sessions = storage.user_sessions(&user).await;
        let ids: Vec<SessionId> = sessions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let storage = MemoryLedger::new();
        let addr1 = UserAddress::from("addr1");
        let addr2 = UserAddress::from("addr2");

        storage.open_session(&addr1, 1).await.unwrap();

        // addr2 sees an empty ledger and cannot touch addr1's session
        assert_eq!(storage.open_session_id(&addr2).await, None);
        let err = storage.close_session(&addr2, 0, 2).await.unwrap_err();
        assert_eq!(err, LedgerError::SessionNotFound);

        // addr2 gets their own id sequence starting at 0
        let session_id = storage.open_session(&addr2, 3).await.unwrap();
        assert_eq!(session_id, 0);
        assert_eq!(storage.open_session_id(&addr1).await, Some(0));
    }
}
