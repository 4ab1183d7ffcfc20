//! Identity and scoring types shared by the server and its clients.
//!
//! Everything here travels on the wire, so the serde attributes are part of
//! the contract: a renamed field is a broken client.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol version clients must announce in their `hello`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Number of letters in every guess and every solution.
pub const WORD_LENGTH: usize = 5;

/// Number of guesses each player gets.
pub const MAX_GUESSES: usize = 6;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one player for as long as their session lives.
///
/// Issued by the server on the first `hello` and kept across reloads as
/// long as the client presents its reconnect token in time. Serialized as a
/// plain number thanks to `#[serde(transparent)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room name chosen by the player who creates it.
///
/// Case-sensitive: `"Lobby"` and `"lobby"` are two different rooms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Wraps a room name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the room name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Opaque identifier of one game session. Never changes once issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// How one letter of a guess relates to the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterStatus {
    /// Right letter, right position.
    Correct,
    /// The letter occurs somewhere else in the solution.
    Present,
    /// The letter does not occur in the solution.
    Absent,
}

/// Where one player's game stands.
///
/// ```text
/// Guessing ──(guess == solution)──→ Won
///     │
///     └──(sixth miss)──→ Lost
/// ```
///
/// `Won` and `Lost` are terminal; a slot never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Guessing,
    Won,
    Lost,
}

impl SlotStatus {
    /// Returns `true` for `Won` and `Lost`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Guessing)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guessing => write!(f, "guessing"),
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
        }
    }
}
