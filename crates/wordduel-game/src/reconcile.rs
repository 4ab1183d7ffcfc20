//! Translating legacy whole-state reports into intents.
//!
//! Older clients send their entire board on every keystroke. The server
//! never adopts that board; it works out which letters, erasures and
//! submissions would move the authoritative slot to the reported one and
//! feeds those through the normal state machine. Anything the state machine
//! refuses is simply not applied, and the reported `gameWon` and
//! `currentRow` are ignored entirely.

use wordduel_protocol::{Intent, ReportedGameState};

use crate::PlayerSlot;

/// Intents that would carry `slot` to the board described by `report`.
///
/// A report that is behind the server (fewer submitted rows) is stale and
/// yields nothing. Rows past the server's are retyped and submitted in
/// order, then the reported in-progress row is retyped.
pub fn intents_from_report(
    slot: &PlayerSlot,
    report: &ReportedGameState,
) -> Vec<Intent> {
    let server_row = slot.current_row();
    if report.prev_guesses.len() < server_row {
        return Vec::new();
    }

    let mut intents = Vec::new();
    let mut typed: Vec<char> = slot.current_guess().chars().collect();

    for guess in &report.prev_guesses[server_row..] {
        let target: Vec<char> = guess.chars().map(|c| c.to_ascii_uppercase()).collect();
        retype(&mut intents, &typed, &target);
        intents.push(Intent::Submit);
        typed.clear();
    }

    let current: Vec<char> = report
        .current_guess
        .iter()
        .filter_map(|tile| tile.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    retype(&mut intents, &typed, &current);

    intents
}

/// Backspaces down to the common prefix of `from` and `to`, then types the
/// rest of `to`.
fn retype(intents: &mut Vec<Intent>, from: &[char], to: &[char]) {
    let common = from
        .iter()
        .zip(to)
        .take_while(|(a, b)| a == b)
        .count();
    intents.extend((common..from.len()).map(|_| Intent::Backspace));
    intents.extend(to[common..].iter().map(|&letter| Intent::Letter { letter }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameSession, Seat, Word, WordList};
    use wordduel_protocol::{PlayerId, RoomId};

    const P1: PlayerId = PlayerId(1);

    fn session() -> GameSession {
        GameSession::new(RoomId::from("r1"), Word::parse("CRANE").unwrap(), P1)
    }

    fn report(current: &str, prev: &[&str]) -> ReportedGameState {
        ReportedGameState {
            current_guess: current.chars().map(String::from).collect(),
            prev_guesses: prev.iter().map(|s| s.to_string()).collect(),
            current_row: prev.len() as u32,
            game_won: false,
        }
    }

    fn letters(word: &str) -> Vec<Intent> {
        word.chars().map(|letter| Intent::Letter { letter }).collect()
    }

    fn apply_all(session: &mut GameSession, intents: &[Intent]) {
        let dict = WordList::parse("crane\nslate").unwrap();
        for intent in intents {
            let _ = session.apply(P1, intent, &dict);
        }
    }

    #[test]
    fn test_typing_one_letter_yields_one_letter_intent() {
        let mut session = session();
        session.apply_letter(P1, 'C').unwrap();
        let slot = session.slot(Seat::P1).unwrap();

        let intents = intents_from_report(slot, &report("CR", &[]));

        assert_eq!(intents, letters("R"));
    }

    #[test]
    fn test_erasing_yields_backspaces() {
        let mut session = session();
        for c in "CRA".chars() {
            session.apply_letter(P1, c).unwrap();
        }
        let slot = session.slot(Seat::P1).unwrap();

        let intents = intents_from_report(slot, &report("C", &[]));

        assert_eq!(intents, vec![Intent::Backspace, Intent::Backspace]);
    }

    #[test]
    fn test_diverging_row_is_retyped_from_common_prefix() {
        let mut session = session();
        for c in "CRO".chars() {
            session.apply_letter(P1, c).unwrap();
        }
        let slot = session.slot(Seat::P1).unwrap();

        let intents = intents_from_report(slot, &report("cra", &[]));

        let mut expected = vec![Intent::Backspace];
        expected.extend(letters("A"));
        assert_eq!(intents, expected);
    }

    #[test]
    fn test_new_row_is_typed_and_submitted() {
        let mut session = session();
        for c in "SLA".chars() {
            session.apply_letter(P1, c).unwrap();
        }
        let slot = session.slot(Seat::P1).unwrap();

        let intents = intents_from_report(slot, &report("", &["SLATE"]));

        let mut expected = letters("TE");
        expected.push(Intent::Submit);
        assert_eq!(intents, expected);
    }

    #[test]
    fn test_stale_report_yields_nothing() {
        let mut session = session();
        apply_all(&mut session, &letters("SLATE"));
        apply_all(&mut session, &[Intent::Submit]);
        let slot = session.slot(Seat::P1).unwrap();

        assert!(intents_from_report(slot, &report("CR", &[])).is_empty());
    }

    #[test]
    fn test_reported_win_is_not_trusted() {
        let session = session();
        let slot = session.slot(Seat::P1).unwrap();
        let mut claim = report("", &[]);
        claim.game_won = true;
        claim.current_row = 6;

        assert!(intents_from_report(slot, &claim).is_empty());
    }

    #[test]
    fn test_applying_report_reaches_reported_board() {
        let mut session = session();
        let slot = session.slot(Seat::P1).unwrap().clone();

        let intents = intents_from_report(&slot, &report("CR", &["SLATE"]));
        apply_all(&mut session, &intents);

        let slot = session.slot(Seat::P1).unwrap();
        assert_eq!(slot.prev_guesses(), &[Word::parse("SLATE").unwrap()]);
        assert_eq!(slot.current_guess(), "CR");
    }

    #[test]
    fn test_unknown_word_in_report_is_not_submitted() {
        let mut session = session();
        let slot = session.slot(Seat::P1).unwrap().clone();

        let intents = intents_from_report(&slot, &report("", &["ZZZZZ"]));
        apply_all(&mut session, &intents);

        let slot = session.slot(Seat::P1).unwrap();
        assert_eq!(slot.current_row(), 0);
        assert!(!slot.won());
    }
}
