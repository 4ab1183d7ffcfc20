//! # WordDuel
//!
//! A two-player word-guessing duel server. Both players chase the same
//! hidden five-letter word on their own boards and watch each other's
//! progress live. The server owns every game: clients send keystrokes,
//! the server scores guesses and decides who won.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wordduel::prelude::*;
//!
//! # async fn run() -> Result<(), WordDuelError> {
//! let server = WordDuelServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod config;
mod error;
mod handler;
pub mod logging;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::WordDuelError;
pub use server::{WordDuelServer, WordDuelServerBuilder};

/// Everything needed to embed or test a server.
pub mod prelude {
    pub use crate::{ServerConfig, WordDuelError, WordDuelServer, WordDuelServerBuilder};
    pub use wordduel_game::{
        Dictionary, FixedSolution, RandomSolutions, SolutionSource, Word, WordList,
    };
    pub use wordduel_protocol::{
        ClientEvent, ClientProjection, Intent, PlayerId, RoomId, ServerEvent,
    };
    pub use wordduel_room::{GameStore, MemoryStore, RoomConfig};
    pub use wordduel_session::SessionConfig;
}
