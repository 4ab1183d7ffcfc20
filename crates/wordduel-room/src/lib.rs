//! Rooms for WordDuel.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! [`GameSession`](wordduel_game::GameSession). Every event for a room goes
//! through that task's channel, so two submissions for the same room are
//! never applied concurrently.
//!
//! # Key types
//!
//! - [`RoomDirectory`]: creates, finds, rehydrates and evicts rooms
//! - [`RoomHandle`]: sends commands to a running room actor
//! - [`GameStore`]: where sessions are persisted; [`MemoryStore`] in-process
//! - [`RoomConfig`]: idle TTL and channel sizing

mod config;
mod directory;
mod error;
mod room;
mod store;

pub use config::{RoomConfig, RoomState};
pub use directory::{RoomDirectory, validate_room_id};
pub use error::RoomError;
pub use room::{Outbound, RoomHandle, RoomInfo};
pub use store::{GameStore, MemoryStore, StoreError};
