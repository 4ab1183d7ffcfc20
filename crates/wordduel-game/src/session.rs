//! The game session state machine.
//!
//! One [`GameSession`] is the single source of truth for one room: the
//! solution and two player slots. Clients only ever send intents
//! (type a letter, erase one, submit the row); the session decides what
//! they mean.
//!
//! ```text
//!            letter / backspace
//!              ┌──────┐
//!              ▼      │
//!          Guessing ──┘ ──(submit == solution)──→ Won
//!              │
//!              └──(submit, sixth row used)──→ Lost
//! ```
//!
//! A refused intent returns a [`Rejection`] and leaves the session exactly
//! as it was. Callers are expected to drop rejections quietly: a double
//! Enter or a keystroke after the game ended is a client race, not an error.

use rand::Rng;
use serde::{Deserialize, Serialize};
use wordduel_protocol::{
    ClientProjection, GuessResult, Intent, LetterStatus, MAX_GUESSES,
    PlayerId, PublicPlayerState, RoomId, SessionId, SlotStatus, WORD_LENGTH,
};

use crate::word::normalize_letter;
use crate::{Dictionary, Word, evaluate};

// ---------------------------------------------------------------------------
// Seats and slots
// ---------------------------------------------------------------------------

/// A player's position in the session. The room creator is always `P1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    P1,
    P2,
}

impl Seat {
    fn index(self) -> usize {
        match self {
            Self::P1 => 0,
            Self::P2 => 1,
        }
    }

    /// The other seat.
    pub fn other(self) -> Self {
        match self {
            Self::P1 => Self::P2,
            Self::P2 => Self::P1,
        }
    }
}

/// One player's board.
///
/// The row counter is not stored: it is `prev_guesses.len()`, which keeps
/// the two from ever disagreeing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    player_id: PlayerId,
    prev_guesses: Vec<Word>,
    current_guess: String,
    won: bool,
}

impl PlayerSlot {
    fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            prev_guesses: Vec::with_capacity(MAX_GUESSES),
            current_guess: String::with_capacity(WORD_LENGTH),
            won: false,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn prev_guesses(&self) -> &[Word] {
        &self.prev_guesses
    }

    /// The in-progress row, 0–5 uppercase letters.
    pub fn current_guess(&self) -> &str {
        &self.current_guess
    }

    pub fn current_row(&self) -> usize {
        self.prev_guesses.len()
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn status(&self) -> SlotStatus {
        if self.won {
            SlotStatus::Won
        } else if self.prev_guesses.len() >= MAX_GUESSES {
            SlotStatus::Lost
        } else {
            SlotStatus::Guessing
        }
    }

    fn guessing(&self) -> Result<(), Rejection> {
        match self.status() {
            SlotStatus::Guessing => Ok(()),
            status => Err(Rejection::NotGuessing(status)),
        }
    }

    fn public_state(&self, solution: &Word) -> PublicPlayerState {
        PublicPlayerState {
            player_id: self.player_id,
            prev_guesses: self.guess_strings(),
            evaluations: self.evaluations(solution),
            current_row: self.current_row() as u8,
            game_won: self.won,
            status: self.status(),
            current_guess_len: self.current_guess.len() as u8,
        }
    }

    fn guess_strings(&self) -> Vec<String> {
        self.prev_guesses.iter().map(Word::to_string).collect()
    }

    fn evaluations(&self, solution: &Word) -> Vec<Vec<LetterStatus>> {
        let solution = solution.to_string();
        self.prev_guesses
            .iter()
            .map(|guess| evaluate(&solution, &guess.to_string()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an intent was refused. The session is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("player {0} has no seat in this session")]
    NotSeated(PlayerId),

    #[error("slot is no longer guessing ({0})")]
    NotGuessing(SlotStatus),

    #[error("'{0}' is not a letter")]
    NotALetter(char),

    #[error("the row is already full")]
    RowFull,

    #[error("nothing to erase")]
    NothingToErase,

    #[error("guess has {0} letters, 5 required")]
    Incomplete(usize),

    #[error("{0} is not an accepted word")]
    NotAccepted(Word),
}

/// A scored submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored {
    /// Zero-based row the guess landed in.
    pub row: u8,
    pub guess: Word,
    pub statuses: Vec<LetterStatus>,
    /// The slot's status after this guess.
    pub status: SlotStatus,
}

/// What an accepted intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Typed(char),
    Erased(char),
    Scored(Scored),
}

/// Whether anyone is still playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// At least one seated player is still guessing.
    Active,
    /// Every seated player has won or lost.
    Finished,
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// The authoritative state of one room's game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    session_id: SessionId,
    room_id: RoomId,
    solution: Word,
    slots: [Option<PlayerSlot>; 2],
}

impl GameSession {
    /// Starts a session with the creator in `P1` and `P2` open.
    pub fn new(room_id: RoomId, solution: Word, creator: PlayerId) -> Self {
        Self {
            session_id: new_session_id(),
            room_id,
            solution,
            slots: [Some(PlayerSlot::new(creator)), None],
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Server-side only; never put this on the wire unfiltered.
    pub fn solution(&self) -> &Word {
        &self.solution
    }

    pub fn slot(&self, seat: Seat) -> Option<&PlayerSlot> {
        self.slots[seat.index()].as_ref()
    }

    /// Seated players, `P1` first.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.slots.iter().flatten().map(PlayerSlot::player_id)
    }

    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        [Seat::P1, Seat::P2].into_iter().find(|seat| {
            self.slot(*seat)
                .is_some_and(|slot| slot.player_id == player)
        })
    }

    /// The other seated player, if any.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        let seat = self.seat_of(player)?;
        self.slot(seat.other()).map(PlayerSlot::player_id)
    }

    /// Seats `player`, or returns the seat they already hold.
    ///
    /// Returns `None` when both seats belong to other players.
    pub fn seat(&mut self, player: PlayerId) -> Option<Seat> {
        if let Some(seat) = self.seat_of(player) {
            return Some(seat);
        }
        let open = &mut self.slots[Seat::P2.index()];
        if open.is_some() {
            return None;
        }
        *open = Some(PlayerSlot::new(player));
        Some(Seat::P2)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn phase(&self) -> SessionPhase {
        let still_guessing = self
            .slots
            .iter()
            .flatten()
            .any(|slot| slot.status() == SlotStatus::Guessing);
        if still_guessing {
            SessionPhase::Active
        } else {
            SessionPhase::Finished
        }
    }

    // -- Transitions ------------------------------------------------------

    /// Appends a letter to the player's in-progress row.
    pub fn apply_letter(
        &mut self,
        player: PlayerId,
        letter: char,
    ) -> Result<Applied, Rejection> {
        let slot = self.slot_mut(player)?;
        slot.guessing()?;
        if slot.current_guess.len() >= WORD_LENGTH {
            return Err(Rejection::RowFull);
        }
        let letter =
            normalize_letter(letter).map_err(|_| Rejection::NotALetter(letter))?;
        slot.current_guess.push(letter);
        Ok(Applied::Typed(letter))
    }

    /// Removes the last letter of the player's in-progress row.
    pub fn apply_backspace(
        &mut self,
        player: PlayerId,
    ) -> Result<Applied, Rejection> {
        let slot = self.slot_mut(player)?;
        slot.guessing()?;
        slot.current_guess
            .pop()
            .map(Applied::Erased)
            .ok_or(Rejection::NothingToErase)
    }

    /// Submits the in-progress row.
    ///
    /// On success the guess is appended, the row cleared, and the slot
    /// moves to `Won` if the guess is the solution or to `Lost` if that was
    /// the sixth row.
    pub fn submit_guess(
        &mut self,
        player: PlayerId,
        dictionary: &dyn Dictionary,
    ) -> Result<Applied, Rejection> {
        let solution = self.solution;
        let slot = self.slot_mut(player)?;
        slot.guessing()?;

        let typed = slot.current_guess.len();
        if typed != WORD_LENGTH {
            return Err(Rejection::Incomplete(typed));
        }
        let guess = Word::parse(&slot.current_guess)
            .map_err(|_| Rejection::Incomplete(typed))?;
        if !dictionary.is_accepted_guess(&guess) {
            return Err(Rejection::NotAccepted(guess));
        }

        let row = slot.current_row() as u8;
        slot.prev_guesses.push(guess);
        slot.current_guess.clear();
        if guess == solution {
            slot.won = true;
        }

        Ok(Applied::Scored(Scored {
            row,
            guess,
            statuses: evaluate(&solution.to_string(), &guess.to_string()),
            status: slot.status(),
        }))
    }

    /// Dispatches one wire-level intent.
    pub fn apply(
        &mut self,
        player: PlayerId,
        intent: &Intent,
        dictionary: &dyn Dictionary,
    ) -> Result<Applied, Rejection> {
        match intent {
            Intent::Letter { letter } => self.apply_letter(player, *letter),
            Intent::Backspace => self.apply_backspace(player),
            Intent::Submit => self.submit_guess(player, dictionary),
        }
    }

    // -- Projections ------------------------------------------------------

    /// What the opponent of `player` may see of `player`'s slot.
    pub fn public_state(&self, player: PlayerId) -> Option<PublicPlayerState> {
        let seat = self.seat_of(player)?;
        self.slot(seat).map(|slot| slot.public_state(&self.solution))
    }

    /// The full view for `player`: their own slot, the opponent's public
    /// slot, and the solution once their own game is over.
    pub fn snapshot(&self, player: PlayerId) -> Option<ClientProjection> {
        let seat = self.seat_of(player)?;
        let me = self.slot(seat)?;
        let status = me.status();

        Some(ClientProjection {
            room_id: self.room_id.clone(),
            session_id: self.session_id.clone(),
            player_id: me.player_id,
            prev_guesses: me.guess_strings(),
            evaluations: me.evaluations(&self.solution),
            current_guess: me.current_guess.clone(),
            current_row: me.current_row() as u8,
            game_won: me.won,
            status,
            opponent: self
                .slot(seat.other())
                .map(|slot| slot.public_state(&self.solution)),
            solution: self.reveal_to(status),
        })
    }

    /// The message for the player whose guess was just scored.
    pub fn guess_result(&self, scored: &Scored) -> GuessResult {
        GuessResult {
            room_id: self.room_id.clone(),
            row: scored.row,
            guess: scored.guess.to_string(),
            statuses: scored.statuses.clone(),
            status: scored.status,
            solution: self.reveal_to(scored.status),
        }
    }

    fn reveal_to(&self, status: SlotStatus) -> Option<String> {
        status.is_terminal().then(|| self.solution.to_string())
    }

    fn slot_mut(&mut self, player: PlayerId) -> Result<&mut PlayerSlot, Rejection> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|slot| slot.player_id == player)
            .ok_or(Rejection::NotSeated(player))
    }
}

/// Random 128-bit hex id, same scheme as reconnect tokens.
fn new_session_id() -> SessionId {
    let bytes: [u8; 16] = rand::rng().random();
    SessionId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}
