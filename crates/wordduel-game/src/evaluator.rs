//! Scoring a guess against the solution.
//!
//! Scoring is position by position and deliberately naive: a letter that
//! is not in its right place is `Present` whenever the solution contains it
//! anywhere, no matter how many times the guess repeats it. Guessing
//! `SASSY` against `SLATE` therefore marks all three `S`s. Clients render
//! boards from these statuses, so changing the rule would change what
//! every player sees.

use std::collections::BTreeMap;

use wordduel_protocol::LetterStatus;

/// Scores `guess` against `solution`, one status per guess position.
///
/// Both words are expected to be the same length; a position past the end
/// of `solution` can only be `Present` or `Absent`.
pub fn evaluate(solution: &str, guess: &str) -> Vec<LetterStatus> {
    let solution: Vec<char> = solution.chars().collect();
    guess
        .chars()
        .enumerate()
        .map(|(i, letter)| {
            if solution.get(i) == Some(&letter) {
                LetterStatus::Correct
            } else if solution.contains(&letter) {
                LetterStatus::Present
            } else {
                LetterStatus::Absent
            }
        })
        .collect()
}

/// Per-letter status for colouring an on-screen keyboard.
///
/// Walks every guess in order and lets the latest occurrence of a letter
/// decide its colour.
pub fn keyboard_statuses<'a>(
    solution: &str,
    guesses: impl IntoIterator<Item = &'a str>,
) -> BTreeMap<char, LetterStatus> {
    let mut keys = BTreeMap::new();
    for guess in guesses {
        for (letter, status) in guess.chars().zip(evaluate(solution, guess)) {
            keys.insert(letter, status);
        }
    }
    keys
}
