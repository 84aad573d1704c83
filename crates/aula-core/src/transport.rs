//! Transport collaborator seam.
//!
//! The signaling layer that actually moves membership and chat payloads
//! over the network lives behind this trait. The core only sees the
//! state it produces: a membership snapshot at join time and a stream of
//! push events afterwards.

use async_trait::async_trait;
use thiserror::Error;

use crate::room::User;

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection lost: {0}")]
    Connection(String),
}

/// Authoritative membership list returned by a successful join.
#[derive(Debug, Clone, Default)]
pub struct MembershipSnapshot {
    pub users: Vec<User>,
}

/// Push events delivered by the transport after a successful join.
///
/// Events are applied strictly in arrival order by the session's event
/// pump; the transport is responsible for deduplicating redelivered
/// chat payloads (it owns message identity, the core does not).
#[derive(Debug, Clone)]
pub enum TransportEvent {
    UserJoined(User),
    UserLeft(String), // user id
    ChatReceived {
        author: String,
        content: String,
        timestamp_ms: i64,
    },
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Request entry into a room. Returns the current membership on
    /// success. A timeout is the transport's concern and arrives here as
    /// an error.
    async fn request_join(
        &self,
        room_id: &str,
        user_id: &str,
        display_name: &str,
    ) -> Result<MembershipSnapshot, TransportError>;

    /// Send a chat message to all participants.
    async fn send_chat_text(&self, content: &str) -> Result<(), TransportError>;

    /// Leave the current room.
    async fn leave(&self) -> Result<(), TransportError>;
}
