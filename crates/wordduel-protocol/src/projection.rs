//! What a client is allowed to see of a game session.
//!
//! A projection is always computed for one viewer. It carries the viewer's
//! own slot in full and only the public part of the opponent's slot:
//! submitted guesses and their scores, the row counter, the terminal
//! status, and how many letters are typed (never which ones). The solution
//! is included only once the viewer's own game has ended.

use serde::{Deserialize, Serialize};

use crate::{LetterStatus, PlayerId, RoomId, SessionId, SlotStatus};

/// The opponent-visible part of one player's slot.
///
/// This is also the payload of every `on_update_game` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPlayerState {
    pub player_id: PlayerId,
    /// Submitted guesses, oldest first.
    pub prev_guesses: Vec<String>,
    /// One score row per entry in `prev_guesses`.
    pub evaluations: Vec<Vec<LetterStatus>>,
    pub current_row: u8,
    pub game_won: bool,
    pub status: SlotStatus,
    /// Number of letters typed into the in-progress row.
    pub current_guess_len: u8,
}

/// A full snapshot of a session from one player's point of view.
///
/// Sent as `on_load_game_from_room` on every (re)load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProjection {
    pub room_id: RoomId,
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub prev_guesses: Vec<String>,
    pub evaluations: Vec<Vec<LetterStatus>>,
    pub current_guess: String,
    pub current_row: u8,
    pub game_won: bool,
    pub status: SlotStatus,
    /// `None` until a second player has joined.
    pub opponent: Option<PublicPlayerState>,
    /// Revealed only when `status` is terminal.
    pub solution: Option<String>,
}

/// Sent to the submitting player once their guess has been scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResult {
    pub room_id: RoomId,
    /// Zero-based row the guess landed in.
    pub row: u8,
    pub guess: String,
    pub statuses: Vec<LetterStatus>,
    pub status: SlotStatus,
    /// Revealed only when `status` is terminal.
    pub solution: Option<String>,
}
