//! Wire protocol for WordDuel.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): the socket-style
//!   `{"event": ..., "data": ...}` frames.
//! - **Projections** ([`ClientProjection`], [`PublicPlayerState`]): what
//!   one player is allowed to see of a shared session.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): frames ↔ values.
//! - **Mirror** ([`ClientMirror`]): the client-side cache of a projection.
//!
//! It knows nothing about sockets, rooms, or game rules.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Room directory / sessions
//! ```

mod codec;
mod error;
mod events;
mod mirror;
mod projection;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{
    ClientEvent, ErrorPayload, Hello, Intent, ReportedGameState, ServerEvent,
    UpdateGame, Welcome,
};
pub use mirror::ClientMirror;
pub use projection::{ClientProjection, GuessResult, PublicPlayerState};
pub use types::{
    LetterStatus, MAX_GUESSES, PROTOCOL_VERSION, PlayerId, RoomId, SessionId,
    SlotStatus, WORD_LENGTH,
};
