//! The session manager: every player the server currently knows about.
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain struct over `HashMap`s. The server keeps it
//! behind its own `tokio::sync::Mutex`, and every operation here is short
//! and synchronous, so the lock is never held across an await.

use std::collections::HashMap;

use rand::Rng;
use wordduel_protocol::PlayerId;
use wordduel_transport::ConnectionId;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Registry of player sessions.
///
/// ```text
/// create() ──→ [Connected] ──disconnect()──→ [Disconnected]
///                  ↑                              │
///                  └──────── reconnect() ─────────┤
///                                                 ▼ expire_stale()
///                                             [Expired] ──→ cleanup_expired()
/// ```
pub struct SessionManager {
    sessions: HashMap<PlayerId, Session>,

    /// Token → owner index, kept in sync with `sessions`.
    tokens: HashMap<String, PlayerId>,

    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            config,
        }
    }

    /// Issues a brand-new player for `connection`.
    ///
    /// Player ids are random, so a restarted server never hands out an id
    /// that still owns a seat in a stored game.
    pub fn create(&mut self, connection: ConnectionId) -> Session {
        let player_id = self.fresh_player_id();

        let session = Session {
            player_id,
            state: SessionState::Connected,
            reconnect_token: generate_token(),
            connection,
        };

        self.tokens.insert(session.reconnect_token.clone(), player_id);
        self.sessions.insert(player_id, session.clone());

        tracing::info!(%player_id, conn_id = %connection, "session created");
        session
    }

    /// Marks the player as gone and starts the grace period.
    ///
    /// Returns `Ok(false)` without changing anything when `connection` is
    /// no longer the one speaking for the player (it was superseded by a
    /// reconnect).
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the player has no session.
    pub fn disconnect(
        &mut self,
        player_id: PlayerId,
        connection: ConnectionId,
    ) -> Result<bool, SessionError> {
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;

        if session.connection != connection || !session.is_connected() {
            tracing::debug!(
                %player_id,
                conn_id = %connection,
                "stale disconnect ignored"
            );
            return Ok(false);
        }

        session.state = SessionState::Disconnected {
            since: std::time::Instant::now(),
        };
        tracing::info!(%player_id, "player disconnected, grace period started");
        Ok(true)
    }

    /// Resumes the session that owns `token` on a new connection.
    ///
    /// A session that still looks connected is taken over: a page reload
    /// usually opens the new socket before the server notices the old one
    /// closing.
    ///
    /// # Errors
    /// - [`SessionError::InvalidToken`]: token not recognised
    /// - [`SessionError::SessionExpired`]: the grace period has elapsed
    pub fn reconnect(
        &mut self,
        token: &str,
        connection: ConnectionId,
    ) -> Result<Session, SessionError> {
        let player_id = self
            .tokens
            .get(token)
            .copied()
            .ok_or(SessionError::InvalidToken)?;
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::InvalidToken)?;

        match session.state {
            SessionState::Disconnected { since }
                if since.elapsed() >= self.config.reconnect_grace =>
            {
                session.state = SessionState::Expired;
                Err(SessionError::SessionExpired(player_id))
            }
            SessionState::Expired => Err(SessionError::SessionExpired(player_id)),
            SessionState::Disconnected { .. } | SessionState::Connected => {
                if session.is_connected() {
                    tracing::info!(
                        %player_id,
                        old = %session.connection,
                        new = %connection,
                        "session taken over by new connection"
                    );
                } else {
                    tracing::info!(%player_id, conn_id = %connection, "player reconnected");
                }
                session.state = SessionState::Connected;
                session.connection = connection;
                Ok(session.clone())
            }
        }
    }

    /// Expires every disconnected session past its grace period and
    /// returns their ids.
    pub fn expire_stale(&mut self) -> Vec<PlayerId> {
        let grace = self.config.reconnect_grace;
        let mut expired = Vec::new();

        for session in self.sessions.values_mut() {
            if let SessionState::Disconnected { since } = session.state {
                if since.elapsed() >= grace {
                    session.state = SessionState::Expired;
                    expired.push(session.player_id);
                    tracing::info!(
                        player_id = %session.player_id,
                        "session expired"
                    );
                }
            }
        }

        expired
    }

    /// Drops expired sessions and their tokens.
    ///
    /// Kept separate from [`expire_stale`](Self::expire_stale) so callers
    /// can react to the expired ids first.
    pub fn cleanup_expired(&mut self) {
        self.sessions.retain(|_, session| {
            if session.state == SessionState::Expired {
                self.tokens.remove(&session.reconnect_token);
                false
            } else {
                true
            }
        });
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// Number of sessions in any state.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of sessions currently connected.
    pub fn connected_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_connected()).count()
    }
}

impl SessionManager {
    fn fresh_player_id(&self) -> PlayerId {
        let mut rng = rand::rng();
        loop {
            let candidate = PlayerId(rng.random_range(1..=MAX_PLAYER_ID));
            if !self.sessions.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Largest id a browser can hold in a JSON number without rounding.
const MAX_PLAYER_ID: u64 = (1 << 53) - 1;

/// 32 lowercase hex characters from 16 random bytes.
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
