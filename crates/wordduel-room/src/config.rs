//! Room configuration and room state.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Knobs shared by every room the directory creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long a room may go with nobody attached before the sweeper
    /// destroys it, including its persisted record.
    pub idle_ttl: Duration,

    /// Capacity of each room actor's command channel. When it fills up,
    /// senders wait.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(300),
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// Where a room's game stands, derived from its session.
///
/// ```text
/// WaitingForOpponent ──(p2 joins)──→ InProgress ──(both slots terminal)──→ Finished
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Only the creator is seated.
    WaitingForOpponent,
    /// Both seated, at least one still guessing.
    InProgress,
    /// Both seated and both won or lost.
    Finished,
}

impl RoomState {
    /// Returns `true` while the second seat is open.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::WaitingForOpponent)
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForOpponent => write!(f, "WaitingForOpponent"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
