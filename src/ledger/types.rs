// Session ledger types and data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Externally supplied, monotonically non-decreasing counter used to stamp
/// session boundaries. The ledger never advances it; callers sample it from
/// the environment and pass it into each operation.
pub type Tick = u64;

/// Per-user session sequence number, assigned densely from 0.
pub type SessionId = u64;

/// Opaque, externally-authenticated identity of a caller (an account
/// address). The environment vouches for it; the ledger only compares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserAddress(String);

impl UserAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl From<&str> for UserAddress {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl fmt::Display for UserAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tracked work interval for a single user.
///
/// A session is open while `ended_at` is absent. Once closed it is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Sequence number, unique per user.
    pub id: SessionId,
    /// The user that created the session. Never changes.
    pub owner: UserAddress,
    /// Tick at which the session was opened.
    pub started_at: Tick,
    /// Tick at which the session was closed; absent while open.
    pub ended_at: Option<Tick>,
}

impl Session {
    /// Whether the end boundary has not been recorded yet.
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Duration in ticks once closed. `None` while the session is open.
    pub fn duration(&self) -> Option<u64> {
        self.ended_at.map(|ended_at| ended_at - self.started_at)
    }
}

/// Caller-visible failures of ledger operations.
///
/// Every variant is a deterministic caller input/state error; the ledger has
/// no internal fault modes and never mutates anything before failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The caller already holds an open session and must end it first.
    #[error("User currently has an opened session")]
    SessionAlreadyOpen,
    /// The session id is not currently open for the caller: it never existed
    /// for them, is already closed, or belongs to someone else. All three
    /// look identical so a caller cannot probe other users' sessions.
    #[error("Session specified does not exist for this address")]
    SessionNotFound,
    /// Duration was queried for a session that has not ended yet.
    #[error("Session specified has not ended yet")]
    SessionStillOpen,
}
