//! Session records: which player a connection is, and whether it is still
//! around.

use std::time::{Duration, Instant};

use wordduel_protocol::PlayerId;
use wordduel_transport::ConnectionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Knobs for the session layer.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a disconnected player may take to come back with their
    /// token before the session is expired.
    ///
    /// Default: 120 seconds. Long enough for a page reload on a slow
    /// phone; `Duration::ZERO` disables resumption.
    pub reconnect_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(120),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle of one player session.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(grace elapsed)──→ Expired
///       ↑                            │
///       └──────(reconnect token)─────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connected,

    /// Lost the connection at `since`; resumable until
    /// `since + reconnect_grace`.
    Disconnected { since: Instant },

    /// Grace period elapsed. Removed on the next cleanup.
    Expired,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The server's record of one player.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,

    pub state: SessionState,

    /// 32 hex characters (128 random bits). Handed to the client in
    /// `welcome`; presenting it in a later `hello` resumes this session.
    pub reconnect_token: String,

    /// The connection currently speaking for this player. A reconnect moves
    /// the session to the new connection, and a late disconnect from the
    /// old one is ignored.
    pub connection: ConnectionId,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }
}
