// Notification types and payloads

use crate::ledger::types::{SessionId, UserAddress};
use serde::{Deserialize, Serialize};

/// Discrete notification produced after a successful ledger transition.
///
/// Notifications are handed to a sink synchronously, in emission order; the
/// caller environment is responsible for delivering or persisting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionNotification {
    /// A session was opened.
    SessionStarted {
        user: UserAddress,
        session_id: SessionId,
    },
    /// A session was closed, with its duration in ticks.
    SessionEnded {
        user: UserAddress,
        session_id: SessionId,
        duration: u64,
    },
}

impl SessionNotification {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionNotification::SessionStarted { .. } => "session_started",
            SessionNotification::SessionEnded { .. } => "session_ended",
        }
    }

    /// The user the notification concerns.
    pub fn user(&self) -> &UserAddress {
        match self {
            SessionNotification::SessionStarted { user, .. } => user,
            SessionNotification::SessionEnded { user, .. } => user,
        }
    }

    pub fn session_id(&self) -> SessionId {
        match self {
            SessionNotification::SessionStarted { session_id, .. } => *session_id,
            SessionNotification::SessionEnded { session_id, .. } => *session_id,
        }
    }
}
