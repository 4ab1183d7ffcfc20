//! Unified error type for the WordDuel server.

use wordduel_game::WordError;
use wordduel_protocol::ProtocolError;
use wordduel_room::{RoomError, StoreError};
use wordduel_session::SessionError;
use wordduel_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors, so `?` works
/// across layers.
#[derive(Debug, thiserror::Error)]
pub enum WordDuelError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Loading or validating a word list.
    #[error(transparent)]
    Word(#[from] WordError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
