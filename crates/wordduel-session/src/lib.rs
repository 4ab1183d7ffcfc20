//! Player identity for WordDuel.
//!
//! Every WebSocket connection is a player. This crate decides *which*
//! player:
//!
//! 1. **Issuance**: a fresh connection gets a new [`PlayerId`] and a
//!    secret reconnect token ([`SessionManager::create`]).
//! 2. **Resumption**: a connection that presents a live token gets the
//!    same `PlayerId` back, so rooms still recognise it as the seated
//!    player ([`SessionManager::reconnect`]).
//! 3. **Expiry**: a player who stays away longer than the grace period is
//!    forgotten ([`SessionManager::expire_stale`]).
//!
//! ```text
//! Room layer (above)    ← seats players by PlayerId
//!     ↕
//! Session layer (here)  ← maps connections to PlayerIds
//!     ↕
//! Protocol (below)      ← PlayerId itself
//! ```
//!
//! [`PlayerId`]: wordduel_protocol::PlayerId

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig, SessionState};
