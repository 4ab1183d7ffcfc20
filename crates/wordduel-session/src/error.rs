//! Error types for the session layer.

use wordduel_protocol::PlayerId;

/// Errors from [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given player. Either it never existed or
    /// it was already cleaned up.
    #[error("session not found for player {0}")]
    NotFound(PlayerId),

    /// The reconnect token was never issued, or belonged to a session that
    /// has since been removed.
    #[error("invalid reconnect token")]
    InvalidToken,

    /// The token was valid, but the grace period had run out.
    #[error("session expired for player {0}")]
    SessionExpired(PlayerId),
}
