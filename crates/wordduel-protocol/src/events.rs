//! The socket-style event surface.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Event names are snake_case and match what the browser client emits and
//! listens for, e.g. `create_room`, `on_load_game_from_room`.
//!
//! `#[serde(tag = "event", content = "data")]` gives us exactly that
//! "adjacently tagged" shape, so a bare room name is just
//! `{"event":"join_room","data":"r1"}`.

use serde::{Deserialize, Serialize};

use crate::{ClientProjection, GuessResult, PlayerId, PublicPlayerState, RoomId};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// First frame on every connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub version: u32,
    /// Token from a previous `welcome`; lets a reloaded page keep its
    /// player identity and therefore its seat.
    #[serde(default)]
    pub reconnect_token: Option<String>,
}

/// One keystroke-level change to the sender's own slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    Letter { letter: char },
    Backspace,
    Submit,
}

/// A whole-board report in the shape older clients emit.
///
/// The server treats it as a proposal only: it is translated into intents
/// and each intent is validated like any other.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportedGameState {
    /// In-progress letters, one string per tile.
    pub current_guess: Vec<String>,
    pub prev_guesses: Vec<String>,
    pub current_row: u32,
    pub game_won: bool,
}

/// Payload of `update_game`. Exactly one of `intent` / `game_state` is
/// expected; `intent` wins if both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGame {
    pub room_id: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<ReportedGameState>,
}

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Hello(Hello),
    CreateRoom(RoomId),
    JoinRoom(RoomId),
    LoadGameFromRoom(RoomId),
    UpdateGame(UpdateGame),
    LeaveRoom(RoomId),
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Reply to `hello`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub player_id: PlayerId,
    pub reconnect_token: String,
    /// `true` when the presented token restored an earlier identity.
    pub resumed: bool,
}

/// Something the server could not do for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// HTTP-style: 400 bad request, 409 conflict, ...
    pub code: u16,
    pub message: String,
}

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Welcome(Welcome),
    CreateRoomSuccess(RoomId),
    CreateRoomFail(RoomId),
    GameFound(RoomId),
    GameNotFound(RoomId),
    RoomFull(RoomId),
    OnLoadGameFromRoom(ClientProjection),
    /// The opponent's public state after one of their intents was applied.
    OnUpdateGame(PublicPlayerState),
    GuessResult(GuessResult),
    Error(ErrorPayload),
}

impl ServerEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome(_) => "welcome",
            Self::CreateRoomSuccess(_) => "create_room_success",
            Self::CreateRoomFail(_) => "create_room_fail",
            Self::GameFound(_) => "game_found",
            Self::GameNotFound(_) => "game_not_found",
            Self::RoomFull(_) => "room_full",
            Self::OnLoadGameFromRoom(_) => "on_load_game_from_room",
            Self::OnUpdateGame(_) => "on_update_game",
            Self::GuessResult(_) => "guess_result",
            Self::Error(_) => "error",
        }
    }
}
