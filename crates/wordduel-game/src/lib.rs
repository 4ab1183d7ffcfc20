//! Game rules for WordDuel.
//!
//! - [`evaluate`] scores a guess against the solution.
//! - [`Word`] and [`WordList`] hold validated five-letter words;
//!   [`Dictionary`] and [`SolutionSource`] are the seams the server plugs
//!   its word lists into.
//! - [`GameSession`] is the per-room state machine: two slots, one
//!   solution, intents in and [`Applied`] or [`Rejection`] out.
//! - [`intents_from_report`] turns a legacy whole-board report into intents.

mod evaluator;
mod reconcile;
mod session;
mod word;
mod words;

pub use evaluator::{evaluate, keyboard_statuses};
pub use reconcile::intents_from_report;
pub use session::{
    Applied, GameSession, PlayerSlot, Rejection, Scored, Seat, SessionPhase,
};
pub use word::{Word, WordError, normalize_letter};
pub use words::{
    BUILTIN_ANSWERS, Dictionary, FixedSolution, RandomSolutions,
    SolutionSource, WordList,
};
