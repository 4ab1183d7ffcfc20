//! Error types for the room layer.

use wordduel_protocol::{PlayerId, RoomId};

use crate::StoreError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A live room, or a persisted one, already uses this id.
    #[error("room {0} already exists")]
    RoomExists(RoomId),

    /// No live room and no persisted record for this id.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// Both seats belong to other players.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player has no seat in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The room's command channel is closed (the actor stopped).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// Empty or longer than 64 characters.
    #[error("invalid room id {0:?}")]
    InvalidRoomId(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
