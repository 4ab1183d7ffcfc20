//! Client-side mirror of a [`ClientProjection`].
//!
//! A client keeps the last projection it saw so it can redraw instantly
//! (for example after a page reload, before the server's snapshot lands).
//! The mirror is never authoritative: any `on_load_game_from_room`
//! replaces it wholesale, and a missing or stale mirror is always fine.

use crate::{ClientProjection, Intent, ServerEvent, SlotStatus, WORD_LENGTH};

/// Holds the most recent projection for one player in one room.
#[derive(Debug, Clone, Default)]
pub struct ClientMirror {
    projection: Option<ClientProjection>,
}

impl ClientMirror {
    /// An empty mirror, as after a cold start with no local cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the mirror from a locally cached projection.
    pub fn from_cache(cached: ClientProjection) -> Self {
        Self {
            projection: Some(cached),
        }
    }

    /// The current view, if the mirror has been hydrated.
    pub fn projection(&self) -> Option<&ClientProjection> {
        self.projection.as_ref()
    }

    /// Folds one server event into the mirror.
    ///
    /// Returns `true` if the view changed. Patches that arrive before any
    /// snapshot are ignored: without a base to apply them to, the next
    /// snapshot will carry the same information anyway.
    pub fn apply(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::OnLoadGameFromRoom(snapshot) => {
                self.projection = Some(snapshot.clone());
                true
            }
            ServerEvent::OnUpdateGame(opponent) => {
                let Some(view) = &mut self.projection else {
                    return false;
                };
                if opponent.player_id == view.player_id {
                    return false;
                }
                view.opponent = Some(opponent.clone());
                true
            }
            ServerEvent::GuessResult(result) => {
                let Some(view) = &mut self.projection else {
                    return false;
                };
                if result.room_id != view.room_id
                    || usize::from(result.row) != view.prev_guesses.len()
                {
                    // Out of step with what we hold; wait for a snapshot.
                    return false;
                }
                view.prev_guesses.push(result.guess.clone());
                view.evaluations.push(result.statuses.clone());
                view.current_guess.clear();
                view.current_row = result.row + 1;
                view.status = result.status;
                view.game_won = result.status == SlotStatus::Won;
                view.solution.clone_from(&result.solution);
                true
            }
            _ => false,
        }
    }

    /// Echoes one of the player's own keystrokes into the view before the
    /// server has seen it. Submits are left to the `guess_result` that
    /// follows.
    pub fn record_local(&mut self, intent: &Intent) -> bool {
        let Some(view) = &mut self.projection else {
            return false;
        };
        if view.status != SlotStatus::Guessing {
            return false;
        }
        match intent {
            Intent::Letter { letter }
                if letter.is_ascii_alphabetic() && view.current_guess.len() < WORD_LENGTH =>
            {
                view.current_guess.push(letter.to_ascii_uppercase());
                true
            }
            Intent::Backspace => view.current_guess.pop().is_some(),
            Intent::Letter { .. } | Intent::Submit => false,
        }
    }

    /// Drops the cached view, e.g. after `game_not_found`.
    pub fn clear(&mut self) {
        self.projection = None;
    }
}
